use reconcile_dom::{
	memory::MemoryDom,
	spec::{self, Element, Spec, VNode},
	EventManager, NodeId, Session,
};
use std::rc::Rc;


type TestSession = Session<MemoryDom, EventManager<MemoryDom>>;

fn session() -> TestSession {
	logging_::init();
	let mut dom = MemoryDom::new();
	let root = dom.create_root("p");
	let events = EventManager::<MemoryDom>::new(root, |_, _| ());
	Session::new(dom, root, events)
}

fn html(session: &TestSession) -> String {
	session.host().inner_html(*session.root())
}

fn children(session: &TestSession, node: NodeId) -> Vec<NodeId> {
	session.host().children(node).to_vec()
}

fn root_children(session: &TestSession) -> Vec<NodeId> {
	children(session, *session.root())
}

fn element(spec: &Spec) -> &Element {
	spec.value().as_element().expect("not an element")
}

fn fragment_nodes(spec: &Spec) -> &[Spec] {
	match spec.value() {
		VNode::Fragment { nodes, .. } => nodes,
		other => panic!("not a fragment: {:?}", other),
	}
}

fn hello_world(id: &str) -> Spec {
	Element::new("div")
		.prop("id", id)
		.contents(spec::fragment([spec::text("Hello"), Element::new("div").contents(spec::text("World")).build()]))
		.build()
}

#[test]
fn text() {
	let mut session = session();
	session.reconcile(&spec::text("Hello World"));
	let node = root_children(&session)[0];

	let vdom = session.reconcile(&spec::text("Heyo"));
	assert_eq!(vdom, spec::text("Heyo"));
	assert_eq!(html(&session), "Heyo");
	assert_eq!(root_children(&session), [node]);
}

#[test]
fn element_with_same_contents() {
	let mut session = session();
	let vdom = session.reconcile(&hello_world("x"));
	let outer = root_children(&session)[0];
	let inner = children(&session, outer)[1];

	let vdom = session.reconcile(
		&Element::new("div")
			.prop("id", "y")
			.contents(element(&vdom).contents.clone())
			.build(),
	);
	assert_eq!(vdom, hello_world("y"));
	assert_eq!(html(&session), r#"<div id="y">Hello<div>World</div></div>"#);
	assert_eq!(root_children(&session), [outer]);
	assert_eq!(children(&session, outer)[1], inner);
}

#[test]
fn superseded_props_and_contents() {
	let mut session = session();
	let vdom = session.reconcile(&hello_world("x"));

	element(&vdom).props.supersede(Element::new("div").prop("id", "y").props);
	element(&vdom).contents.supersede(spec::fragment([spec::text("Boo")]));
	let updated = session.reconcile(&vdom);

	assert_eq!(
		updated,
		Element::new("div")
			.prop("id", "y")
			.contents(spec::fragment([spec::text("Boo")]))
			.build()
	);
	assert!(!Rc::ptr_eq(&updated, &vdom));
	assert_eq!(html(&session), r#"<div id="y">Boo</div>"#);
}

#[test]
fn superseded_text_becomes_element() {
	let mut session = session();
	let vdom = session.reconcile(&hello_world("x"));
	let outer = root_children(&session)[0];
	let [hello, world]: [NodeId; 2] = children(&session, outer).try_into().unwrap();

	fragment_nodes(&element(&vdom).contents)[0].supersede(Element::new("div").contents(spec::text("Hello")).build());
	session.reconcile(&vdom);

	assert_eq!(html(&session), r#"<div id="x"><div>Hello</div><div>World</div></div>"#);
	let now = children(&session, outer);
	assert_ne!(now[0], hello);
	assert_eq!(now[1], world);
	assert_eq!(session.host().parent(hello), None);
}

#[test]
fn adds_children() {
	let mut session = session();
	session.reconcile(&Element::new("div").contents(spec::fragment([spec::text("a")])).build());
	let div = root_children(&session)[0];
	let a = children(&session, div)[0];

	session.reconcile(
		&Element::new("div")
			.contents(spec::fragment([
				spec::text("a"),
				spec::text("b"),
				Element::new("span").contents(spec::text("c")).build(),
			]))
			.build(),
	);
	assert_eq!(html(&session), "<div>ab<span>c</span></div>");
	assert_eq!(root_children(&session), [div]);
	assert_eq!(children(&session, div)[0], a);
}

#[test]
fn removes_children() {
	let mut session = session();
	session.reconcile(&spec::fragment([spec::text("a"), spec::text("b"), spec::text("c")]));
	let [a, b, c]: [NodeId; 3] = root_children(&session).try_into().unwrap();

	session.reconcile(&spec::fragment([spec::text("a")]));
	assert_eq!(html(&session), "a");
	assert_eq!(root_children(&session), [a]);
	assert_eq!(session.host().parent(b), None);
	assert_eq!(session.host().parent(c), None);
}

#[test]
fn keyed_reorder_keeps_nodes() {
	let mut session = session();
	session.reconcile(&spec::fragment([
		spec::keyed_text("one", "Hello World"),
		spec::keyed_text("two", "Boo"),
	]));
	let [one, two]: [NodeId; 2] = root_children(&session).try_into().unwrap();

	session.reconcile(&spec::fragment([spec::keyed_text("two", "Goop"), spec::keyed_text("one", "Boop")]));
	assert_eq!(html(&session), "GoopBoop");
	assert_eq!(root_children(&session), [two, one]);
}

#[test]
fn keyed_elements_move_with_their_subtrees() {
	let mut session = session();
	let item = |key: &str| Element::new("li").key(key).contents(spec::text(key)).build();
	session.reconcile(&Element::new("ul").contents(spec::fragment([item("a"), item("b"), item("c")])).build());
	let ul = root_children(&session)[0];
	let [a, b, c]: [NodeId; 3] = children(&session, ul).try_into().unwrap();
	let a_text = children(&session, a)[0];

	session.reconcile(&Element::new("ul").contents(spec::fragment([item("c"), item("a"), item("b")])).build());
	assert_eq!(html(&session), "<ul><li>c</li><li>a</li><li>b</li></ul>");
	assert_eq!(children(&session, ul), [c, a, b]);
	assert_eq!(children(&session, a), [a_text]);
}

#[test]
fn unkeyed_positions_inside_nested_fragments() {
	let mut session = session();
	session.reconcile(&spec::fragment([spec::fragment([spec::text("a")]), spec::text("b")]));
	let [a, b]: [NodeId; 2] = root_children(&session).try_into().unwrap();

	// ".0.0." and ".1." again, despite the added sibling inside the nested fragment.
	session.reconcile(&spec::fragment([
		spec::fragment([spec::text("A"), spec::text("new")]),
		spec::text("B"),
	]));
	assert_eq!(html(&session), "AnewB");
	let now = root_children(&session);
	assert_eq!(now[0], a);
	assert_eq!(now[2], b);
}

#[test]
fn tag_change_replaces_node() {
	let mut session = session();
	session.reconcile(&Element::new("div").key("k").prop("title", "t").build());
	let div = root_children(&session)[0];

	session.reconcile(&Element::new("span").key("k").prop("title", "t").build());
	assert_eq!(html(&session), r#"<span title="t"></span>"#);
	let span = root_children(&session)[0];
	assert_ne!(span, div);
	assert_eq!(session.host().parent(div), None);
}

#[test]
fn idempotent() {
	let mut session = session();
	let spec = Element::new("form")
		.prop("class", "c")
		.event("submit", "send")
		.contents(spec::fragment([
			Element::new("input").key("name").prop("value", "v").build(),
			spec::raw_markup("<hr>"),
			spec::keyed_text("label", "Name"),
		]))
		.build();
	let first = session.reconcile(&spec);
	let html_before = html(&session);
	let mutations = session.host().mutation_count();

	let second = session.reconcile(&spec);
	assert_eq!(session.host().mutation_count(), mutations);
	assert_eq!(html(&session), html_before);
	assert_eq!(first, second);
	assert!(Rc::ptr_eq(&second, &spec));
}

#[test]
fn minimal_prop_updates() {
	let mut session = session();
	session.reconcile(&Element::new("div").prop("a", 1).prop("b", 2).prop("c", 3).build());
	let div = root_children(&session)[0];
	let mutations = session.host().mutation_count();

	session.reconcile(&Element::new("div").prop("a", 1).prop("b", 20).prop("c", 3).build());
	assert_eq!(session.host().mutation_count(), mutations + 1);
	assert_eq!(session.host().attribute(div, "b"), Some("20"));
	assert_eq!(html(&session), r#"<div a="1" b="20" c="3"></div>"#);

	session.reconcile(&Element::new("div").prop("a", 1).build());
	assert_eq!(html(&session), r#"<div a="1"></div>"#);
	assert_eq!(root_children(&session), [div]);
}

#[test]
fn raw_markup_replaced_only_on_change() {
	let mut session = session();
	session.reconcile(&spec::fragment([spec::raw_markup("<i>x</i>"), spec::text("!")]));
	let [markup, text]: [NodeId; 2] = root_children(&session).try_into().unwrap();

	session.reconcile(&spec::fragment([spec::raw_markup("<i>x</i>"), spec::text("!")]));
	assert_eq!(root_children(&session), [markup, text]);

	session.reconcile(&spec::fragment([spec::raw_markup("<b>y</b>"), spec::text("!")]));
	assert_eq!(html(&session), "<b>y</b>!");
	let now = root_children(&session);
	assert_ne!(now[0], markup);
	assert_eq!(now[1], text);
	assert_eq!(session.host().parent(markup), None);
}

#[test]
fn duplicate_keys_later_sibling_wins() {
	let mut session = session();
	let spec = spec::fragment([spec::keyed_text("a", "1"), spec::keyed_text("a", "2")]);
	session.reconcile(&spec);
	assert_eq!(html(&session), "12");
	let [first, second]: [NodeId; 2] = root_children(&session).try_into().unwrap();

	session.reconcile(&spec);
	assert_eq!(html(&session), "12");
	let now = root_children(&session);
	assert_eq!(now[0], second);
	assert_ne!(now[1], first);
	assert_eq!(session.host().parent(first), None);
}

#[test]
fn supersede_on_applied_tree_is_picked_up() {
	let mut session = session();
	let vdom = session.reconcile(&spec::fragment([spec::keyed_text("a", "1")]));
	fragment_nodes(&vdom)[0].supersede(spec::keyed_text("a", "2"));

	let updated = session.reconcile(&vdom);
	assert_eq!(html(&session), "2");
	assert_eq!(updated, spec::fragment([spec::keyed_text("a", "2")]));
	assert_eq!(session.vdom(), &updated);
}
