//! Crate-level tests over whole bundles.

use camino::Utf8Path;
use insta::assert_snapshot;

use crate::{
    Bundle, FileContent, InsertionMode, LoadStep, SourceTree, WeaveContent, WeaveDescription,
    WeaveError, WeaveManifest, WeaveOptions, WeaveSession, apply_manifest,
};


const MAIN: &str = r#"var Car = (function () {
    function Car(speed) { this.speed = speed; }
    Car.prototype.update = function (dt) {
        this.x += this.speed * dt;
        return this.x;
    };
    return Car;
})();
"#;

fn tree() -> SourceTree {
    let mut tree = SourceTree::new();
    tree.insert("main.js", FileContent::Text(MAIN.to_owned()));
    tree
}

fn woven_main(tree: &SourceTree) -> &str {
    match tree.get(Utf8Path::new("main.js")) {
        Some(FileContent::Text(text)) => text,
        other => panic!("main.js should stay text, got {other:?}"),
    }
}

#[test]
fn session_tail_weave_lands_before_the_return() -> Result<(), WeaveError> {
    let mut bundle = Bundle::new("main.js", "function run() { a(); return b(); }")?;
    let mut session = WeaveSession::new(&mut bundle);
    session.weave(WeaveDescription::new(
        "run",
        InsertionMode::Tail,
        WeaveContent::Code("log();".to_owned()),
    ))?;
    let log = session.finish();

    assert_eq!(log.len(), 1);
    assert_eq!(bundle.source(), "function run() { a(); log();return b(); }");
    Ok(())
}

#[test]
fn cancellable_callback_is_woven_into_a_prototype_method() {
    let manifest = WeaveManifest::from_json(
        r#"{ "mods": [ { "id": "frozen-cars", "bundles": { "main.js": { "weaves": [
            { "method": "Car.prototype.update", "at": "HEAD", "cancellable": true,
              "callback": "(car, info) => { if (car.frozen) info.cancelWithValue(car.x); }" }
        ] } } } ] }"#,
    )
    .expect("manifest");
    let mut files = tree();
    apply_manifest(&mut files, &manifest, WeaveOptions::default()).expect("weaves");

    assert_snapshot!(woven_main(&files), @r#"
    var Car = (function () {
        function Car(speed) { this.speed = speed; }
        Car.prototype.update = function (dt) {var info = {"name":"Car.prototype.update","cancellable":true,"cancelled":false};info.cancel = () => { info.cancelled = true; };info.cancelWithValue = (value) => { info.cancelled = true; info.returnValue = value; }; if (this.frozen) info.cancelWithValue(this.x); if (info.cancelled) return info.returnValue;
            this.x += this.speed * dt;
            return this.x;
        };
        return Car;
    })();
    "#);
}

#[test]
fn syntax_breaking_weaves_are_rejected() {
    let manifest = WeaveManifest::from_json(
        r#"{ "mods": [ { "id": "typo", "bundles": { "main.js": { "weaves": [
            { "method": "Car.prototype.update", "at": "TAIL", "code": "if (oops {" }
        ] } } } ] }"#,
    )
    .expect("manifest");
    let mut files = tree();
    let error = apply_manifest(&mut files, &manifest, WeaveOptions::default())
        .expect_err("breaks the bundle");

    assert_eq!(error.step, LoadStep::Method(0));
    assert!(matches!(*error.source, WeaveError::Reconstitution { .. }));
    assert_eq!(woven_main(&files), MAIN);
}
