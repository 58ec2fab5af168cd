use meact_dom::{
	children, create_element, mount, reconcile::is_reconciling, Component, Element, ElementType, Error, Listener, Prop, Props, Reconciler, State, Updater,
};
use std::{cell::RefCell, rc::Rc};

use memory_host_::{init_logging, MemoryHost, Op};

thread_local! {
	static UPDATERS: RefCell<Vec<Updater>> = RefCell::new(Vec::new());
	static RENDER_RESULTS: RefCell<Vec<Result<(), Error>>> = RefCell::new(Vec::new());
}

fn last_updater() -> Updater {
	UPDATERS.with(|updaters| updaters.borrow().last().cloned().expect("no component constructed"))
}

struct Counter {
	updater: Updater,
}
impl Component for Counter {
	fn new(_: &Props, updater: Updater) -> Self {
		UPDATERS.with(|updaters| updaters.borrow_mut().push(updater.clone()));
		Self { updater }
	}

	fn initial_state(&self, _: &Props) -> State {
		State::new().with("count", 0).with("label", "clicks")
	}

	fn render(&self, _: &Props, state: &State) -> Element {
		let count = state.get("count").and_then(Prop::as_number).unwrap_or_default();
		let label = state.get("label").and_then(Prop::as_str).unwrap_or_default();
		let updater = self.updater.clone();
		let increment = Listener::new(move |_| updater.set_state(State::new().with("count", count + 1.0)).unwrap());
		create_element(
			"div",
			None,
			children![
				create_element("span", None, children![format!("{}: {}", label, count)]),
				create_element("button", Some(Props::new().with("onClick", increment)), children!["+"]),
			],
		)
	}
}

#[test]
fn state_round_trip() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&create_element(ElementType::component::<Counter>(), None, children![])).unwrap();
	let updater = last_updater();
	assert!(updater.is_mounted());

	updater.set_state(State::new().with("count", 1)).unwrap();
	let component = handle.root().unwrap().as_component().unwrap().clone();
	assert_eq!(component.state(), State::new().with("count", 1).with("label", "clicks"));

	updater.set_state(State::new().with("count", 2)).unwrap();
	assert_eq!(component.state().get("label"), Some(&Prop::from("clicks")));
	assert_eq!(host.inner_html(container), "<div><span>clicks: 2</span><button>+</button></div>");
}

#[test]
fn set_state_reuses_host_nodes() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&create_element(ElementType::component::<Counter>(), None, children![])).unwrap();
	let before = host.descendants(container);
	host.take_ops();

	last_updater().set_state(State::new().with("count", 5)).unwrap();

	assert_eq!(host.descendants(container), before);
	assert!(host.take_ops().iter().all(|op| !op.is_structural()));
	assert_eq!(handle.root().unwrap().dom(), before[1]);
}

#[test]
fn listeners_drive_state() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&create_element(ElementType::component::<Counter>(), None, children![])).unwrap();
	let div = handle.root().unwrap().dom();
	let button = host.children(div)[1];

	assert_eq!(host.dispatch(button, "click"), 1);
	assert_eq!(host.dispatch(button, "click"), 1);
	assert_eq!(host.dispatch(button, "click"), 1);

	assert_eq!(host.inner_html(div), "<span>clicks: 3</span><button>+</button>");
	assert_eq!(host.listener_count(button, "click"), 1);
}

#[test]
fn unmounted_component_is_detached() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&create_element(ElementType::component::<Counter>(), None, children![])).unwrap();
	let updater = last_updater();

	handle.unmount().unwrap();

	assert!(!updater.is_mounted());
	assert_eq!(updater.set_state(State::new().with("count", 1)), Err(Error::Detached));
	assert!(host.children(container).is_empty());
}

#[test]
fn parentless_component_is_detached() {
	init_logging();
	let host = MemoryHost::new();
	let reconciler = Reconciler::new(host.clone());
	let instance = reconciler.instantiate(&create_element(ElementType::component::<Counter>(), None, children![])).unwrap();
	let updater = last_updater();
	host.take_ops();

	assert_eq!(updater.set_state(State::new().with("count", 1)), Err(Error::Detached));

	let component = instance.as_component().unwrap();
	assert_eq!(component.state().get("count"), Some(&Prop::Number(0.0)));
	assert!(host.ops().is_empty());
}

struct Eager {
	updater: Updater,
}
impl Component for Eager {
	fn new(_: &Props, updater: Updater) -> Self {
		Self { updater }
	}

	fn render(&self, props: &Props, state: &State) -> Element {
		assert!(is_reconciling());
		let result = self.updater.set_state(State::new().with("touched", true));
		RENDER_RESULTS.with(|results| results.borrow_mut().push(result));
		let text = props.get("text").and_then(Prop::to_text).unwrap_or_default();
		let touched = state.get("touched").is_some();
		create_element("p", None, children![text, touched])
	}
}

#[test]
fn set_state_during_render_is_rejected() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	let eager = |text: &'static str| create_element(ElementType::component::<Eager>(), Some(Props::new().with("text", text)), children![]);

	handle.render(&eager("first")).unwrap();
	handle.render(&eager("second")).unwrap();

	let results = RENDER_RESULTS.with(|results| results.borrow_mut().drain(..).collect::<Vec<_>>());
	// The first render happens before the instance exists.
	assert_eq!(results, [Err(Error::Detached), Err(Error::Reentrant)]);
	assert!(!is_reconciling());
	assert_eq!(host.inner_html(container), "<p>second</p>");
	assert_eq!(handle.root().unwrap().as_component().unwrap().state(), State::new());
}

struct Toggle;
impl Component for Toggle {
	fn new(_: &Props, updater: Updater) -> Self {
		UPDATERS.with(|updaters| updaters.borrow_mut().push(updater));
		Self
	}

	fn initial_state(&self, _: &Props) -> State {
		State::new().with("on", false)
	}

	fn render(&self, _: &Props, state: &State) -> Element {
		if state.get("on").and_then(Prop::as_bool).unwrap_or_default() {
			create_element("div", None, children!["on"])
		} else {
			create_element("span", None, children!["off"])
		}
	}
}

#[test]
fn rendered_type_change_replaces_under_parent() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle
		.render(&create_element("section", None, children!["before", create_element(ElementType::component::<Toggle>(), None, children![]), "after"]))
		.unwrap();
	let section = handle.root().unwrap().dom();
	let old = host.children(section)[1];
	host.take_ops();

	last_updater().set_state(State::new().with("on", true)).unwrap();

	let new = host.children(section)[1];
	assert_ne!(new, old);
	assert!(host.ops().contains(&Op::Replace { parent: section, new, old }));
	assert_eq!(host.inner_html(container), "<section>before<div>on</div>after</section>");
	let toggle = &handle.root().unwrap().as_host().unwrap().children()[1];
	assert_eq!(toggle.dom(), new);

	// The parent instance sees the new node, so a later update still finds it.
	handle
		.render(&create_element("section", None, children!["before", create_element(ElementType::component::<Toggle>(), None, children![]), "later"]))
		.unwrap();
	assert_eq!(host.inner_html(container), "<section>before<div>on</div>later</section>");
}

struct Greeting;
impl Component for Greeting {
	fn new(_: &Props, _: Updater) -> Self {
		Self
	}

	fn render(&self, props: &Props, _: &State) -> Element {
		let name = props.get("name").and_then(Prop::to_text).unwrap_or_default();
		create_element("h1", None, children![format!("Hello, {}!", name)])
	}
}

fn greeting(name: &'static str) -> Element {
	create_element(ElementType::component::<Greeting>(), Some(Props::new().with("name", name)), children![])
}

#[test]
fn new_props_rerender_same_instance() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&greeting("Alice")).unwrap();
	let component = handle.root().unwrap().as_component().unwrap().clone();
	let h1 = handle.root().unwrap().dom();

	handle.render(&greeting("Bob")).unwrap();

	assert!(Rc::ptr_eq(&component, handle.root().unwrap().as_component().unwrap()));
	assert_eq!(handle.root().unwrap().dom(), h1);
	assert_eq!(component.props().get("name"), Some(&Prop::from("Bob")));
	assert_eq!(host.inner_html(container), "<h1>Hello, Bob!</h1>");
}

#[test]
fn component_type_change_detaches_old_component() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&create_element(ElementType::component::<Counter>(), None, children![])).unwrap();
	let counter = last_updater();

	handle.render(&greeting("Carol")).unwrap();

	assert!(!counter.is_mounted());
	assert_eq!(counter.set_state(State::new()), Err(Error::Detached));
	assert_eq!(host.inner_html(container), "<h1>Hello, Carol!</h1>");
}

struct Frame;
impl Component for Frame {
	fn new(_: &Props, _: Updater) -> Self {
		Self
	}

	fn render(&self, _: &Props, _: &State) -> Element {
		create_element(ElementType::component::<Counter>(), None, children![])
	}
}

#[test]
fn nested_components_share_the_host_node() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&create_element(ElementType::component::<Frame>(), None, children![])).unwrap();
	let frame = handle.root().unwrap().as_component().unwrap().clone();
	let div = handle.root().unwrap().dom();

	last_updater().set_state(State::new().with("label", "taps")).unwrap();

	assert_eq!(host.children(container), [div]);
	frame.with_child(|counter| assert_eq!(counter.dom(), div));
	assert_eq!(host.inner_html(container), "<div><span>taps: 0</span><button>+</button></div>");
}

#[test]
fn unmounted_component_stays_detached_while_kept_alive() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle
		.render(&create_element("section", None, children![create_element(ElementType::component::<Counter>(), None, children![])]))
		.unwrap();
	let section = handle.root().unwrap().dom();
	let kept = handle.root().unwrap().as_host().unwrap().children()[0].as_component().unwrap().clone();
	let updater = last_updater();

	handle.unmount().unwrap();
	let detached = host.inner_html(section);
	host.take_ops();

	assert!(!kept.is_mounted());
	assert!(!updater.is_mounted());
	assert_eq!(updater.set_state(State::new().with("count", 7)), Err(Error::Detached));
	assert_eq!(kept.state().get("count"), Some(&Prop::Number(0.0)));
	assert_eq!(host.inner_html(section), detached);
	assert!(host.ops().is_empty());
}

struct Tagged;
impl Component for Tagged {
	fn new(_: &Props, updater: Updater) -> Self {
		UPDATERS.with(|updaters| updaters.borrow_mut().push(updater));
		Self
	}

	fn render(&self, props: &Props, state: &State) -> Element {
		let tag = state.get("tag").or_else(|| props.get("tag")).and_then(Prop::to_text).unwrap_or_default();
		create_element(tag, None, children!["content"])
	}
}

fn tagged(tag: &'static str) -> Element {
	create_element(ElementType::component::<Tagged>(), Some(Props::new().with("tag", tag)), children![])
}

#[test]
fn failed_rerender_keeps_previous_props() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&tagged("p")).unwrap();
	let component = handle.root().unwrap().as_component().unwrap().clone();

	assert!(matches!(handle.render(&tagged("")), Err(Error::MalformedElement { .. })));
	assert_eq!(component.props().get("tag"), Some(&Prop::from("p")));
	assert_eq!(host.inner_html(container), "<p>content</p>");

	handle.render(&tagged("p")).unwrap();
	assert_eq!(host.inner_html(container), "<p>content</p>");
	handle.render(&tagged("em")).unwrap();
	assert_eq!(host.inner_html(container), "<em>content</em>");
}

#[test]
fn failed_set_state_restores_state() {
	init_logging();
	let host = MemoryHost::new();
	let container = host.container();
	let mut handle = mount(host.clone(), container);
	handle.render(&tagged("p")).unwrap();
	let updater = last_updater();

	assert!(matches!(updater.set_state(State::new().with("tag", "")), Err(Error::MalformedElement { .. })));
	assert!(handle.root().unwrap().as_component().unwrap().state().is_empty());
	assert_eq!(host.inner_html(container), "<p>content</p>");

	updater.set_state(State::new().with("tag", "b")).unwrap();
	assert_eq!(host.inner_html(container), "<b>content</b>");
}
