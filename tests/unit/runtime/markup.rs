use super::*;

#[test]
fn nested_elements_and_escaping() {
    let mut w = DomMarkupWriter::new();
    w.element("p", &[("class", "a\"b")]);
    w.write("1 < 2 & 3");
    w.element("br", &[]);
    w.end().unwrap();
    w.end().unwrap();
    assert_eq!(
        w.to_markup(),
        "<p class=\"a&quot;b\">1 &lt; 2 &amp; 3<br/></p>"
    );
}

#[test]
fn attributes_can_be_added_after_children() {
    let mut w = DomMarkupWriter::new();
    let form = w.element("form", &[("method", "post")]);
    w.element("input", &[("name", "x")]);
    w.end().unwrap();
    w.attributes(form, &[("enctype", "multipart/form-data"), ("method", "get")]);
    w.end().unwrap();
    assert_eq!(
        w.to_markup(),
        "<form method=\"get\" enctype=\"multipart/form-data\"><input name=\"x\"/></form>"
    );
}

#[test]
fn unbalanced_end_is_an_error() {
    let mut w = DomMarkupWriter::new();
    assert!(w.end().is_err());
    assert!(w.current().is_none());
}
