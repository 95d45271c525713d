// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bound Values
//!
//! Everything a naming store can hold at a name is a [`BoundValue`], a tagged
//! variant over:
//!
//! | Variant | Meaning | Resolved at lookup by |
//! |---------|---------|-----------------------|
//! | `Object` | a concrete shared object | returned as-is (same `Arc`) |
//! | `Reference` | factory id + addresses | the registered object factory |
//! | `Link` | a name pointing elsewhere | re-resolving the target name |
//! | `Context` | a foreign naming store | continuing the lookup inside it |

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::domain::errors::NamingError;
use crate::domain::name::Name;
use crate::domain::store::NamingStore;

/// Class name reported for contexts (implicit, explicit or federated).
pub const CONTEXT_CLASS: &str = "nomen::Context";

/// Class name reported for link bindings.
pub const LINK_CLASS: &str = "nomen::LinkRef";

/// Prefix marking a link target as relative to the link's own parent context.
pub const RELATIVE_LINK_PREFIX: &str = "./";

/// Opaque shared object bound into a naming store.
///
/// Cloning is cheap and keeps identity: two clones are [`Object::ptr_eq`].
#[derive(Clone)]
pub struct Object {
    inner: Arc<dyn Any + Send + Sync>,
    class_name: String,
}

impl Object {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            class_name: std::any::type_name::<T>().to_string(),
        }
    }

    /// Wrap an already-shared value without re-allocating.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            class_name: std::any::type_name::<T>().to_string(),
        }
    }

    /// Override the class name reported by listings.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Identity comparison: true when both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class_name", &self.class_name)
            .field("ptr", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

/// One address entry of a [`Reference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefAddr {
    pub addr_type: String,
    pub content: String,
}

/// Serializable descriptor of how to reconstruct an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Class of the object the factory produces.
    pub class_name: String,
    /// Identifier of the object factory registered with the resolution engine.
    pub factory: String,
    #[serde(default)]
    pub addresses: Vec<RefAddr>,
}

impl Reference {
    pub fn new(class_name: impl Into<String>, factory: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            factory: factory.into(),
            addresses: Vec::new(),
        }
    }

    pub fn with_address(mut self, addr_type: impl Into<String>, content: impl Into<String>) -> Self {
        self.addresses.push(RefAddr {
            addr_type: addr_type.into(),
            content: content.into(),
        });
        self
    }

    /// Content of the first address with the given type.
    pub fn address(&self, addr_type: &str) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == addr_type)
            .map(|a| a.content.as_str())
    }
}

/// Where a link points once interpreted against the name it is bound at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Resolve in the same store as the link.
    Relative(Name),
    /// Resolve from the root of the context the lookup started in.
    Absolute(Name),
}

/// Named pointer to another location. Never holds an object pointer; the
/// target is resolved lazily at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub target: String,
}

impl LinkRef {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn is_relative(&self) -> bool {
        self.target == "." || self.target.starts_with(RELATIVE_LINK_PREFIX)
    }

    /// Interpret the target for a link bound at `bound_at`.
    ///
    /// `./x` resolves against the parent of `bound_at`; any other target is
    /// absolute.
    pub fn resolve_target(&self, bound_at: &Name) -> Result<LinkTarget, NamingError> {
        if self.is_relative() {
            let rest = self.target.strip_prefix('.').unwrap_or("");
            let relative = Name::parse(rest)?;
            let parent = bound_at.parent().unwrap_or_default();
            Ok(LinkTarget::Relative(parent.join(&relative)))
        } else {
            Ok(LinkTarget::Absolute(Name::parse(&self.target)?))
        }
    }
}

/// Value held at a name.
#[derive(Clone)]
pub enum BoundValue {
    Object(Object),
    Reference(Reference),
    Link(LinkRef),
    Context(Arc<dyn NamingStore>),
}

impl BoundValue {
    pub fn object<T: std::any::Any + Send + Sync>(value: T) -> Self {
        BoundValue::Object(Object::new(value))
    }

    pub fn link(target: impl Into<String>) -> Self {
        BoundValue::Link(LinkRef::new(target))
    }

    pub fn class_name(&self) -> &str {
        match self {
            BoundValue::Object(object) => object.class_name(),
            BoundValue::Reference(reference) => &reference.class_name,
            BoundValue::Link(_) => LINK_CLASS,
            BoundValue::Context(_) => CONTEXT_CLASS,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BoundValue::Object(_) => "object",
            BoundValue::Reference(_) => "reference",
            BoundValue::Link(_) => "link",
            BoundValue::Context(_) => "context",
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            BoundValue::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Object(object) => f.debug_tuple("Object").field(object).finish(),
            BoundValue::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
            BoundValue::Link(link) => f.debug_tuple("Link").field(link).finish(),
            BoundValue::Context(_) => f.write_str("Context(..)"),
        }
    }
}

impl From<Object> for BoundValue {
    fn from(object: Object) -> Self {
        BoundValue::Object(object)
    }
}

impl From<Reference> for BoundValue {
    fn from(reference: Reference) -> Self {
        BoundValue::Reference(reference)
    }
}

impl From<LinkRef> for BoundValue {
    fn from(link: LinkRef) -> Self {
        BoundValue::Link(link)
    }
}

/// Name and class of one child of a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameClassPair {
    pub name: String,
    pub class_name: String,
}

/// One child of a context as reported by a store.
///
/// `value` is `None` for sub-contexts of the same store, whether they were
/// created explicitly or exist only because a deeper name is bound.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub class_name: String,
    pub value: Option<BoundValue>,
}

impl Binding {
    pub fn bound(name: impl Into<String>, value: BoundValue) -> Self {
        Self {
            name: name.into(),
            class_name: value.class_name().to_string(),
            value: Some(value),
        }
    }

    pub fn with_class_name(name: impl Into<String>, class_name: impl Into<String>, value: BoundValue) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            value: Some(value),
        }
    }

    pub fn subcontext(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: CONTEXT_CLASS.to_string(),
            value: None,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self.value, None | Some(BoundValue::Context(_)))
    }

    pub fn name_class_pair(&self) -> NameClassPair {
        NameClassPair {
            name: self.name.clone(),
            class_name: self.class_name.clone(),
        }
    }
}
