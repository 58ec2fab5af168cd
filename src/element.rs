//! Immutable element trees and the factory that builds them.

use crate::component::ComponentType;
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::{borrow::Cow, rc::Rc};
use tracing::warn;

/// Name of the reserved prop holding an element's ordered children.
pub const CHILDREN: &str = "children";

/// Name of the single prop carried by text elements.
pub const NODE_VALUE: &str = "nodeValue";

/// What an [`Element`] renders as. Decided once, when the element is created.
#[derive(Clone, PartialEq, Eq)]
pub enum ElementType {
	/// A host tag like `div`.
	Tag(Cow<'static, str>),
	/// The reserved text node type. Its content is the [`NODE_VALUE`] prop.
	Text,
	/// A stateful component whose rendered output is reconciled as its only child.
	Component(ComponentType),
}
impl ElementType {
	/// Shorthand for [`ComponentType::of`].
	#[must_use]
	pub fn component<C: crate::Component>() -> Self {
		Self::Component(ComponentType::of::<C>())
	}

	#[must_use]
	pub fn is_host(&self) -> bool {
		!matches!(self, Self::Component(_))
	}
}
impl Debug for ElementType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Tag(name) => write!(f, "<{}>", name),
			Self::Text => f.write_str("#text"),
			Self::Component(component) => Debug::fmt(component, f),
		}
	}
}
impl From<&'static str> for ElementType {
	fn from(name: &'static str) -> Self {
		Self::Tag(Cow::Borrowed(name))
	}
}
impl From<String> for ElementType {
	fn from(name: String) -> Self {
		Self::Tag(Cow::Owned(name))
	}
}
impl From<ComponentType> for ElementType {
	fn from(component: ComponentType) -> Self {
		Self::Component(component)
	}
}

/// An event handler. Compared by identity, so handing the same `Listener` to two renders is a no-op for the listener diff.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&dyn Any)>);
impl Listener {
	pub fn new(handler: impl 'static + Fn(&dyn Any)) -> Self {
		Self(Rc::new(handler))
	}

	/// Invokes the handler with a host-specific event value.
	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.as_ptr() == other.as_ptr()
	}

	/// Identity of the handler, usable as a map key.
	#[must_use]
	pub fn as_ptr(&self) -> *const () {
		Rc::as_ptr(&self.0).cast::<()>()
	}
}
impl PartialEq for Listener {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}
impl Eq for Listener {}
impl Debug for Listener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Listener").field(&self.as_ptr()).finish()
	}
}

/// A single prop (or state) value.
#[derive(Clone, PartialEq)]
pub enum Prop {
	Str(Cow<'static, str>),
	Number(f64),
	Bool(bool),
	Listener(Listener),
}
impl Prop {
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(str) => Some(&**str),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_number(&self) -> Option<f64> {
		match *self {
			Self::Number(number) => Some(number),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match *self {
			Self::Bool(bool) => Some(bool),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_listener(&self) -> Option<&Listener> {
		match self {
			Self::Listener(listener) => Some(listener),
			_ => None,
		}
	}

	/// The value as a host would show it as text, or [`None`] for listeners.
	#[must_use]
	pub fn to_text(&self) -> Option<String> {
		match self {
			Self::Str(str) => Some(str.to_string()),
			Self::Number(number) => Some(number.to_string()),
			Self::Bool(bool) => Some(bool.to_string()),
			Self::Listener(_) => None,
		}
	}
}
impl Debug for Prop {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Str(str) => Debug::fmt(str, f),
			Self::Number(number) => Debug::fmt(number, f),
			Self::Bool(bool) => Debug::fmt(bool, f),
			Self::Listener(listener) => Debug::fmt(listener, f),
		}
	}
}
impl From<&'static str> for Prop {
	fn from(str: &'static str) -> Self {
		Self::Str(Cow::Borrowed(str))
	}
}
impl From<String> for Prop {
	fn from(string: String) -> Self {
		Self::Str(Cow::Owned(string))
	}
}
impl From<f64> for Prop {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}
impl From<i32> for Prop {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}
impl From<u32> for Prop {
	fn from(number: u32) -> Self {
		Self::Number(number.into())
	}
}
impl From<bool> for Prop {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}
impl From<Listener> for Prop {
	fn from(listener: Listener) -> Self {
		Self::Listener(listener)
	}
}

/// An element's property bag: named values plus the reserved, ordered [`CHILDREN`].
#[derive(Clone, Default, PartialEq)]
pub struct Props {
	values: HashMap<Cow<'static, str>, Prop>,
	children: Vec<Element>,
}
impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style [`Props::insert`].
	#[must_use]
	pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Prop>) -> Self {
		self.insert(name, value);
		self
	}

	/// Sets a named value, returning the previous one.
	///
	/// [`CHILDREN`] is reserved and can't be set this way.
	pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Prop>) -> Option<Prop> {
		let name = name.into();
		if name == CHILDREN {
			warn!("Ignored attempt to set the reserved `children` prop by name.");
			return None;
		}
		self.values.insert(name, value.into())
	}

	pub fn remove(&mut self, name: &str) -> Option<Prop> {
		self.values.remove(name)
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Prop> {
		self.values.get(name)
	}

	pub fn iter(&self) -> impl '_ + Iterator<Item = (&str, &Prop)> {
		self.values.iter().map(|(name, value)| (&**name, value))
	}

	/// The number of named values, not counting children.
	#[must_use]
	pub fn len(&self) -> usize {
		self.values.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	#[must_use]
	pub fn children(&self) -> &[Element] {
		&self.children
	}
}
impl Debug for Props {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		for (name, value) in &self.values {
			if cfg!(feature = "dangerous-logging") {
				map.entry(name, value);
			} else {
				map.entry(name, &format_args!("…"));
			}
		}
		if !self.children.is_empty() {
			map.entry(&CHILDREN, &self.children);
		}
		map.finish()
	}
}

/// An immutable description of a desired node. Cloning is cheap.
#[derive(Clone)]
pub struct Element(Rc<ElementData>);
struct ElementData {
	r#type: ElementType,
	props: Props,
}
impl Element {
	#[must_use]
	pub fn element_type(&self) -> &ElementType {
		&self.0.r#type
	}

	#[must_use]
	pub fn props(&self) -> &Props {
		&self.0.props
	}

	#[must_use]
	pub fn children(&self) -> &[Element] {
		&self.0.props.children
	}

	/// Whether both handles refer to the very same element.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other) || (self.0.r#type == other.0.r#type && self.0.props == other.0.props)
	}
}
impl Debug for Element {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element").field("type", &self.0.r#type).field("props", &self.0.props).finish()
	}
}

/// One child argument to [`create_element`] after list flattening.
#[derive(Debug, Clone)]
pub enum Child {
	Element(Element),
	Str(Cow<'static, str>),
	Number(f64),
	Bool(bool),
	Null,
}
impl Child {
	/// [`None`] for children that are dropped, otherwise the child as element.
	fn into_element(self) -> Option<Element> {
		match self {
			Self::Element(element) => Some(element),
			Self::Null | Self::Bool(false) => None,
			Self::Str(str) => Some(create_text_element(Prop::Str(str))),
			Self::Number(number) => Some(create_text_element(number)),
			Self::Bool(true) => Some(create_text_element(true)),
		}
	}
}

/// A child argument to [`create_element`]: either one child or a list of them, which is flattened.
///
/// Lists can't nest, so flattening is always exactly one level deep.
#[derive(Debug, Clone)]
pub enum ChildArg {
	One(Child),
	Many(Vec<Child>),
}

macro_rules! impl_child_from {
	($($source:ty => |$value:ident| $child:expr),*$(,)?) => {$(
		impl From<$source> for Child {
			fn from($value: $source) -> Self {
				$child
			}
		}
		impl From<$source> for ChildArg {
			fn from(value: $source) -> Self {
				Self::One(value.into())
			}
		}
	)*};
}

impl_child_from! {
	Element => |element| Child::Element(element),
	&'static str => |str| Child::Str(Cow::Borrowed(str)),
	String => |string| Child::Str(Cow::Owned(string)),
	f64 => |number| Child::Number(number),
	i32 => |number| Child::Number(number.into()),
	u32 => |number| Child::Number(number.into()),
	bool => |bool| Child::Bool(bool),
}

impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(option: Option<T>) -> Self {
		option.map_or(Self::Null, Into::into)
	}
}
impl<T: Into<Child>> From<Option<T>> for ChildArg {
	fn from(option: Option<T>) -> Self {
		Self::One(option.into())
	}
}
impl From<Child> for ChildArg {
	fn from(child: Child) -> Self {
		Self::One(child)
	}
}
impl From<Vec<Child>> for ChildArg {
	fn from(children: Vec<Child>) -> Self {
		Self::Many(children)
	}
}
impl From<Vec<Element>> for ChildArg {
	fn from(elements: Vec<Element>) -> Self {
		Self::Many(elements.into_iter().map(Child::Element).collect())
	}
}
impl IntoIterator for ChildArg {
	type Item = Child;
	type IntoIter = std::vec::IntoIter<Child>;

	fn into_iter(self) -> Self::IntoIter {
		match self {
			Self::One(child) => vec![child].into_iter(),
			Self::Many(children) => children.into_iter(),
		}
	}
}

/// Collects mixed child arguments for [`create_element`].
///
/// ```
/// use meact_dom::{children, create_element};
///
/// let list = create_element("ul", None, children![
/// 	create_element("li", None, children!["first"]),
/// 	vec![create_element("li", None, children![2])],
/// 	None::<&str>,
/// ]);
/// assert_eq!(list.children().len(), 2);
/// ```
#[macro_export]
macro_rules! children {
	() => {
		::std::vec::Vec::<$crate::ChildArg>::new()
	};
	($($child:expr),+$(,)?) => {
		::std::vec![$($crate::ChildArg::from($child)),*]
	};
}

/// Creates an element.
///
/// `config` is copied into the new element's props (its children, if any, are replaced).
/// Child lists are flattened one level, `null` and `false` children are dropped
/// and any remaining non-element child becomes a text element.
pub fn create_element(r#type: impl Into<ElementType>, config: Option<Props>, children: impl IntoIterator<Item = ChildArg>) -> Element {
	let mut props = config.unwrap_or_default();
	props.children = children.into_iter().flatten().filter_map(Child::into_element).collect();
	Element(Rc::new(ElementData { r#type: r#type.into(), props }))
}

/// Creates an element of the reserved text type with a single [`NODE_VALUE`] prop.
pub fn create_text_element(value: impl Into<Prop>) -> Element {
	create_element(ElementType::Text, Some(Props::new().with(NODE_VALUE, value)), None::<ChildArg>)
}
