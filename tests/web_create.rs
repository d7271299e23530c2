#![cfg(all(target_arch = "wasm32", feature = "web"))]

use js_sys::Reflect;
use reconcile_dom::{
	spec::{self, Element},
	EventConfig,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

use web_session_::Fixture;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn text() {
	let fixture = Fixture::new(EventConfig::default());
	fixture.reconcile(&spec::text("Hello reconcile-dom!"));
	assert_eq!(fixture.container.inner_html(), "Hello reconcile-dom!");
}

#[wasm_bindgen_test]
fn element_tree() {
	let fixture = Fixture::new(EventConfig::default());
	fixture.reconcile(
		&Element::new("div")
			.prop("id", "x")
			.contents(spec::fragment([spec::text("Hello"), Element::new("div").contents(spec::text("World")).build()]))
			.build(),
	);
	assert_eq!(fixture.container.inner_html(), r#"<div id="x">Hello<div>World</div></div>"#);

	fixture.reconcile(&Element::new("div").prop("id", "y").contents(spec::text("Boo")).build());
	assert_eq!(fixture.container.inner_html(), r#"<div id="y">Boo</div>"#);
}

#[wasm_bindgen_test]
fn raw_markup() {
	let fixture = Fixture::new(EventConfig::default());
	fixture.reconcile(&spec::fragment([spec::raw_markup("<b>bold</b>"), spec::text("!")]));
	assert_eq!(fixture.container.inner_html(), "<b>bold</b>!");
}

#[wasm_bindgen_test]
fn value_is_a_property() {
	let fixture = Fixture::new(EventConfig::default());
	fixture.reconcile(&Element::new("input").prop("value", "typed").build());
	let input = fixture.container.first_element_child().unwrap();
	assert_eq!(input.get_attribute("value"), None);
	assert_eq!(Reflect::get(&input, &JsValue::from_str("value")).unwrap().as_string().as_deref(), Some("typed"));
}

#[wasm_bindgen_test]
fn keyed_reorder_keeps_nodes() {
	let fixture = Fixture::new(EventConfig::default());
	fixture.reconcile(&spec::fragment([spec::keyed_text("one", "Hello"), spec::keyed_text("two", "Boo")]));
	let one = fixture.container.first_child().unwrap();

	fixture.reconcile(&spec::fragment([spec::keyed_text("two", "Goop"), spec::keyed_text("one", "Boop")]));
	assert_eq!(fixture.container.inner_html(), "GoopBoop");
	assert!(fixture.container.last_child().unwrap().is_same_node(Some(&one)));
}
