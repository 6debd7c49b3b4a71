use crate::{assemble, assemble_with, sandbox_frame, DocumentOptions, REACT_DOM_UMD, REACT_UMD};
use bigo_transform::{transform, Compiled, Dialect, TransformResult};

fn compiled(code: &str) -> TransformResult {
    Ok(Compiled {
        code: code.to_string(),
    })
}

#[test]
fn test_empty_inputs_yield_minimal_document() {
    let doc = assemble("", "", &compiled(""), Dialect::EsNext);

    println!("Generated HTML:\n{}", doc);

    assert_eq!(
        doc,
        "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">\n    <style>\n    </style>\n  </head>\n  <body>\n    <script>\n    </script>\n  </body>\n</html>\n"
    );
    assert!(!doc.contains("undefined"));
    assert!(!doc.contains("null"));
}

#[test]
fn test_success_document_embeds_buffers_in_order() {
    let doc = assemble(
        "<h1>Hi</h1>",
        "h1 { color: red; }",
        &compiled("console.log(1);"),
        Dialect::EsNext,
    );

    let style = doc.find("h1 { color: red; }").unwrap();
    let body = doc.find("<h1>Hi</h1>").unwrap();
    let script = doc.find("console.log(1);").unwrap();
    assert!(style < body && body < script);
    assert!(!doc.contains("unpkg.com"));
}

#[test]
fn test_jsx_document_loads_runtime_before_code() {
    let doc = assemble("<div id='root'></div>", "", &compiled("render();"), Dialect::Jsx);

    let react = doc.find(REACT_UMD).unwrap();
    let react_dom = doc.find(REACT_DOM_UMD).unwrap();
    let code = doc.find("render();").unwrap();
    assert!(react < react_dom && react_dom < code);
    assert!(doc.contains(&format!("<script crossorigin src=\"{}\"></script>", REACT_UMD)));
}

#[test]
fn test_custom_runtime_scripts() {
    let options = DocumentOptions {
        runtime_scripts: vec!["/vendor/preact.js".to_string()],
        ..DocumentOptions::default()
    };
    let doc = assemble_with("", "", &compiled(""), Dialect::Jsx, &options);
    assert!(doc.contains("src=\"/vendor/preact.js\""));
    assert!(!doc.contains(REACT_UMD));
}

#[test]
fn test_user_text_cannot_close_its_block() {
    let doc = assemble(
        "",
        "a::after { content: '</STYLE>'; }",
        &compiled("const s = '</script><b>x</b>';"),
        Dialect::EsNext,
    );
    assert!(doc.contains("const s = '<\\/script><b>x</b>';"));
    assert!(doc.contains("content: '<\\/STYLE>';"));
    assert_eq!(doc.matches("</script>").count(), 1);
    assert_eq!(doc.matches("</style>").count(), 1);
}

#[test]
fn test_user_text_is_not_reindented() {
    let code = "const t = `a\n  b`;";
    let doc = assemble("", "", &compiled(code), Dialect::EsNext);
    assert!(doc.contains(code));
}

#[test]
fn test_failure_document_replaces_preview() {
    let failure = transform("function {", Dialect::EsNext);
    let doc = assemble("<h1>Hidden</h1>", "h1 { color: blue }", &failure, Dialect::EsNext);

    assert!(doc.contains("<body>Unexpected token (1:9)</body>"));
    assert!(doc.contains("color:red;font-size:24px;"));
    assert!(doc.contains("justify-content:center"));
    assert!(!doc.contains("Hidden"));
    assert!(!doc.contains("color: blue"));
    assert!(!doc.contains("<script"));
}

#[test]
fn test_failure_message_is_escaped() {
    let failure = transform("<div></span>", Dialect::Jsx);
    let doc = assemble("", "", &failure, Dialect::Jsx);
    assert!(doc.contains("Expected corresponding JSX closing tag for &lt;div&gt; (1:5)"));
}

#[test]
fn test_compact_output() {
    let options = DocumentOptions {
        pretty: false,
        ..DocumentOptions::default()
    };
    let doc = assemble_with("<p>x</p>", "", &compiled("go()"), Dialect::EsNext, &options);
    assert_eq!(
        doc,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style></style></head><body><p>x</p><script>go()</script></body></html>"
    );
}

#[test]
fn test_options_deserialize_camel_case() {
    let options: DocumentOptions =
        serde_json::from_str(r#"{"runtimeScripts": [], "pretty": false}"#).unwrap();
    assert!(options.runtime_scripts.is_empty());
    assert!(!options.pretty);
    assert_eq!(options.indent, "  ");
}

#[test]
fn test_sandbox_frame_escapes_document() {
    let frame = sandbox_frame("<p class=\"x\">a & b</p>", "allow-scripts", Some("bigo-preview-3"));
    assert_eq!(
        frame,
        "<iframe name=\"bigo-preview-3\" title=\"preview\" sandbox=\"allow-scripts\" srcdoc=\"&lt;p class=&quot;x&quot;&gt;a &amp; b&lt;/p&gt;\" frameborder=\"0\" width=\"100%\" height=\"100%\"></iframe>"
    );
}

#[test]
fn test_unnamed_locked_down_frame() {
    let frame = sandbox_frame("", "", None);
    assert!(frame.starts_with("<iframe title=\"preview\" sandbox=\"\" "));
    assert!(!frame.contains("name="));
}
