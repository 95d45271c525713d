// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Resolution Engine
//!
//! [`NamingContext`] is a view over a naming store at some prefix. Every
//! lookup runs one interpreter loop over a cursor that is either a name in a
//! store or a value with a remainder still to resolve:
//!
//! ```text
//!  Name{store, name} --lookup--> Context            => Resolved::Context(view)
//!                                Bound(v)           => Value{v, remaining = []}
//!                                Partial(v, rest)   => Value{v, remaining = rest}
//!
//!  Value{Object}     remaining = []                 => Resolved::Object
//!                    remaining from store           => NotContext
//!                    remaining from factory         => Continuation
//!  Value{Context}    => Name{foreign store, remaining}
//!  Value{Link}       => Name{target + remaining}           (one hop)
//!  Value{Reference}  => factory(reference, remaining)      (one hop)
//! ```
//!
//! Links and references each cost one hop. More than `max_link_depth` hops
//! fails with [`NamingError::LinkDepthExceeded`], which also terminates
//! circular links.
//!
//! A link target of the form `./x` resolves in the link's own store relative
//! to the link's parent; any other target resolves from the root of the
//! store the context was opened on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::application::event_coordinator::{ListenerId, NamingListener};
use crate::application::object_factory::{FactoryOutcome, ObjectFactoryRegistry};
use crate::domain::errors::NamingError;
use crate::domain::events::EventScope;
use crate::domain::name::Name;
use crate::domain::naming_config::ResolutionConfig;
use crate::domain::store::{NamingStore, ResolveResult, StoreEntry};
use crate::domain::value::{BoundValue, LinkRef, LinkTarget, NameClassPair, Object, Reference, CONTEXT_CLASS};

pub const DEFAULT_MAX_LINK_DEPTH: usize = 32;

/// Terminal result of a resolution.
#[derive(Clone)]
pub enum Resolved {
    Object(Object),
    Context(NamingContext),
    /// Reference with no registered factory.
    Reference(Reference),
    /// Only produced by [`NamingContext::lookup_link`] and listings.
    Link(LinkRef),
}

impl Resolved {
    pub fn kind(&self) -> &'static str {
        match self {
            Resolved::Object(_) => "object",
            Resolved::Context(_) => "context",
            Resolved::Reference(_) => "reference",
            Resolved::Link(_) => "link",
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Resolved::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Object> {
        match self {
            Resolved::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn into_context(self) -> Option<NamingContext> {
        match self {
            Resolved::Context(context) => Some(context),
            _ => None,
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Object(object) => f.debug_tuple("Object").field(object).finish(),
            Resolved::Context(context) => f.debug_tuple("Context").field(context).finish(),
            Resolved::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
            Resolved::Link(link) => f.debug_tuple("Link").field(link).finish(),
        }
    }
}

/// Outcome of [`NamingContext::resolve`].
#[derive(Debug, Clone)]
pub enum Resolution {
    Complete(Resolved),
    /// Resolution reached an object from another naming system; the caller
    /// has to continue with `remaining` against `resolved`.
    Continuation(ResolveResult),
}

/// One listed child with its value resolved.
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
    pub name: String,
    pub class_name: String,
    pub value: Resolved,
}

enum Cursor {
    Name {
        store: Arc<dyn NamingStore>,
        name: Name,
    },
    Value {
        store: Arc<dyn NamingStore>,
        bound_at: Name,
        value: BoundValue,
        remaining: Name,
        from_factory: bool,
    },
}

#[derive(Clone)]
pub struct NamingContext {
    /// Store absolute links resolve against.
    root: Arc<dyn NamingStore>,
    store: Arc<dyn NamingStore>,
    prefix: Name,
    factories: Arc<ObjectFactoryRegistry>,
    max_link_depth: usize,
    /// Shared by clones of this handle, not by views derived from it.
    closed: Arc<AtomicBool>,
}

impl NamingContext {
    /// Root context over `store` with no factories and the default hop bound.
    pub fn new(store: Arc<dyn NamingStore>) -> Self {
        Self {
            root: Arc::clone(&store),
            store,
            prefix: Name::root(),
            factories: Arc::new(ObjectFactoryRegistry::new()),
            max_link_depth: DEFAULT_MAX_LINK_DEPTH,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_factories(mut self, factories: ObjectFactoryRegistry) -> Self {
        self.factories = Arc::new(factories);
        self
    }

    pub fn with_max_link_depth(mut self, max_link_depth: usize) -> Self {
        self.max_link_depth = max_link_depth;
        self
    }

    pub fn with_resolution_config(self, config: &ResolutionConfig) -> Self {
        self.with_max_link_depth(config.max_link_depth)
    }

    pub fn store(&self) -> &Arc<dyn NamingStore> {
        &self.store
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn max_link_depth(&self) -> usize {
        self.max_link_depth
    }

    fn view(&self, store: Arc<dyn NamingStore>, prefix: Name) -> NamingContext {
        NamingContext {
            root: Arc::clone(&self.root),
            store,
            prefix,
            factories: Arc::clone(&self.factories),
            max_link_depth: self.max_link_depth,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn ensure_open(&self) -> Result<(), NamingError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(NamingError::Closed);
        }
        Ok(())
    }

    fn full_name(&self, name: &Name) -> Name {
        self.prefix.join(name)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    pub fn lookup(&self, name: &Name) -> Result<Resolved, NamingError> {
        let result = self.resolve(name).and_then(|resolution| match resolution {
            Resolution::Complete(resolved) => Ok(resolved),
            Resolution::Continuation(rest) => Err(NamingError::CannotProceed {
                resolved_name: rest.resolved_name.to_string(),
                remaining: rest.remaining.to_string(),
            }),
        });
        record_lookup(&result);
        result
    }

    /// Parse `name` and look it up.
    pub fn lookup_str(&self, name: &str) -> Result<Resolved, NamingError> {
        self.lookup(&Name::parse(name)?)
    }

    /// Like [`Self::lookup`], but a link bound at the terminal name is
    /// returned instead of followed.
    pub fn lookup_link(&self, name: &Name) -> Result<Resolved, NamingError> {
        let cursor = Cursor::Name {
            store: Arc::clone(&self.store),
            name: self.full_name(name),
        };
        let result = self.run(cursor, name, false).and_then(|resolution| match resolution {
            Resolution::Complete(resolved) => Ok(resolved),
            Resolution::Continuation(rest) => Err(NamingError::CannotProceed {
                resolved_name: rest.resolved_name.to_string(),
                remaining: rest.remaining.to_string(),
            }),
        });
        record_lookup(&result);
        result
    }

    /// Resolve `name`, exposing continuations instead of failing on them.
    pub fn resolve(&self, name: &Name) -> Result<Resolution, NamingError> {
        let cursor = Cursor::Name {
            store: Arc::clone(&self.store),
            name: self.full_name(name),
        };
        self.run(cursor, name, true)
    }

    fn hop(&self, hops: &mut usize, name: &Name) -> Result<(), NamingError> {
        *hops += 1;
        metrics::counter!("nomen_link_hops_total").increment(1);
        if *hops > self.max_link_depth {
            tracing::warn!(name = %name, limit = self.max_link_depth, "Link depth exceeded");
            return Err(NamingError::LinkDepthExceeded {
                name: name.to_string(),
                limit: self.max_link_depth,
            });
        }
        Ok(())
    }

    fn run(&self, mut cursor: Cursor, requested: &Name, follow_terminal_link: bool) -> Result<Resolution, NamingError> {
        self.ensure_open()?;
        let mut hops = 0usize;
        loop {
            cursor = match cursor {
                Cursor::Name { store, name } => match store.lookup(&name)? {
                    StoreEntry::Context => {
                        return Ok(Resolution::Complete(Resolved::Context(self.view(store, name))));
                    }
                    StoreEntry::Bound(value) => Cursor::Value {
                        store,
                        bound_at: name,
                        value,
                        remaining: Name::root(),
                        from_factory: false,
                    },
                    StoreEntry::Partial(partial) => Cursor::Value {
                        store,
                        bound_at: partial.resolved_name,
                        value: partial.resolved,
                        remaining: partial.remaining,
                        from_factory: false,
                    },
                },

                Cursor::Value {
                    store,
                    bound_at,
                    value,
                    remaining,
                    from_factory,
                } => match value {
                    BoundValue::Object(object) => {
                        if remaining.is_empty() {
                            return Ok(Resolution::Complete(Resolved::Object(object)));
                        }
                        if from_factory {
                            return Ok(Resolution::Continuation(ResolveResult {
                                resolved: BoundValue::Object(object),
                                resolved_name: bound_at,
                                remaining,
                            }));
                        }
                        return Err(NamingError::NotContext(bound_at.to_string()));
                    }

                    BoundValue::Context(foreign) => {
                        debug!(at = %bound_at, remaining = %remaining, "Continuing in federated context");
                        Cursor::Name {
                            store: foreign,
                            name: remaining,
                        }
                    }

                    BoundValue::Link(link) => {
                        if remaining.is_empty() && !follow_terminal_link {
                            return Ok(Resolution::Complete(Resolved::Link(link)));
                        }
                        self.hop(&mut hops, requested)?;
                        debug!(at = %bound_at, target = %link.target, hop = hops, "Following link");
                        match link.resolve_target(&bound_at)? {
                            LinkTarget::Relative(target) => Cursor::Name {
                                store,
                                name: target.join(&remaining),
                            },
                            LinkTarget::Absolute(target) => Cursor::Name {
                                store: Arc::clone(&self.root),
                                name: target.join(&remaining),
                            },
                        }
                    }

                    BoundValue::Reference(reference) => {
                        let Some(factory) = self.factories.get(&reference.factory) else {
                            if remaining.is_empty() {
                                return Ok(Resolution::Complete(Resolved::Reference(reference)));
                            }
                            return Err(NamingError::CannotProceed {
                                resolved_name: bound_at.to_string(),
                                remaining: remaining.to_string(),
                            });
                        };
                        self.hop(&mut hops, requested)?;
                        debug!(at = %bound_at, factory = %reference.factory, hop = hops, "Invoking object factory");
                        match factory.get_object_instance(&reference, &bound_at, &remaining)? {
                            FactoryOutcome::Resolved(value) => Cursor::Value {
                                store,
                                bound_at,
                                value,
                                remaining,
                                from_factory: true,
                            },
                            FactoryOutcome::Partial { resolved, remaining } => Cursor::Value {
                                store,
                                bound_at,
                                value: resolved,
                                remaining,
                                from_factory: true,
                            },
                        }
                    }
                },
            };
        }
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    fn context_at(&self, name: &Name) -> Result<NamingContext, NamingError> {
        self.ensure_open()?;
        if name.is_empty() {
            return Ok(self.clone());
        }
        match self.lookup(name)? {
            Resolved::Context(context) => Ok(context),
            _ => Err(NamingError::NotContext(self.full_name(name).to_string())),
        }
    }

    pub fn list(&self, name: &Name) -> Result<Vec<NameClassPair>, NamingError> {
        let context = self.context_at(name)?;
        context.store.list(&context.prefix)
    }

    /// Children of `name` with references materialized through their
    /// factories. Links are reported unfollowed.
    pub fn list_bindings(&self, name: &Name) -> Result<Vec<ResolvedBinding>, NamingError> {
        let context = self.context_at(name)?;
        context
            .store
            .list_bindings(&context.prefix)?
            .into_iter()
            .map(|binding| -> Result<ResolvedBinding, NamingError> {
                let child = context.prefix.child(&binding.name);
                let value = match binding.value {
                    None => Resolved::Context(context.view(Arc::clone(&context.store), child)),
                    Some(BoundValue::Object(object)) => Resolved::Object(object),
                    Some(BoundValue::Link(link)) => Resolved::Link(link),
                    Some(BoundValue::Context(foreign)) => Resolved::Context(context.view(foreign, Name::root())),
                    Some(reference @ BoundValue::Reference(_)) => {
                        let cursor = Cursor::Value {
                            store: Arc::clone(&context.store),
                            bound_at: child.clone(),
                            value: reference,
                            remaining: Name::root(),
                            from_factory: false,
                        };
                        match context.run(cursor, &child, false)? {
                            Resolution::Complete(resolved) => resolved,
                            Resolution::Continuation(rest) => {
                                return Err(NamingError::CannotProceed {
                                    resolved_name: rest.resolved_name.to_string(),
                                    remaining: rest.remaining.to_string(),
                                })
                            }
                        }
                    }
                };
                let class_name = match &value {
                    Resolved::Context(_) => CONTEXT_CLASS.to_string(),
                    _ => binding.class_name,
                };
                Ok(ResolvedBinding {
                    name: binding.name,
                    class_name,
                    value,
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Mutation (delegated to the store at the full name)
    // ------------------------------------------------------------------

    fn writable_name(&self, name: &Name) -> Result<Name, NamingError> {
        self.ensure_open()?;
        if name.is_empty() {
            return Err(NamingError::InvalidName("an empty name cannot be bound".to_string()));
        }
        Ok(self.full_name(name))
    }

    pub fn bind(&self, name: &Name, value: impl Into<BoundValue>) -> Result<(), NamingError> {
        self.store.bind(&self.writable_name(name)?, value.into(), None)
    }

    /// Bind with an explicit class name reported by listings.
    pub fn bind_typed(
        &self,
        name: &Name,
        value: impl Into<BoundValue>,
        class_name: impl Into<String>,
    ) -> Result<(), NamingError> {
        self.store
            .bind(&self.writable_name(name)?, value.into(), Some(class_name.into()))
    }

    pub fn rebind(&self, name: &Name, value: impl Into<BoundValue>) -> Result<(), NamingError> {
        self.store.rebind(&self.writable_name(name)?, value.into(), None)
    }

    pub fn unbind(&self, name: &Name) -> Result<(), NamingError> {
        self.store.unbind(&self.writable_name(name)?)
    }

    pub fn rename(&self, old_name: &Name, new_name: &Name) -> Result<(), NamingError> {
        let old_full = self.writable_name(old_name)?;
        let new_full = self.writable_name(new_name)?;
        self.store.rename(&old_full, &new_full)
    }

    pub fn create_subcontext(&self, name: &Name) -> Result<NamingContext, NamingError> {
        let full = self.writable_name(name)?;
        self.store.create_subcontext(&full)?;
        Ok(self.view(Arc::clone(&self.store), full))
    }

    pub fn destroy_subcontext(&self, name: &Name) -> Result<(), NamingError> {
        self.store.destroy_subcontext(&self.writable_name(name)?)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_listener(
        &self,
        name: &Name,
        scope: EventScope,
        listener: Arc<dyn NamingListener>,
    ) -> Result<ListenerId, NamingError> {
        self.ensure_open()?;
        let coordinator = self
            .store
            .event_coordinator()
            .ok_or_else(|| NamingError::read_only("add_listener"))?;
        Ok(coordinator.add_listener(self.full_name(name), scope, listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.store
            .event_coordinator()
            .map(|coordinator| coordinator.remove_listener(id))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Misc
    // ------------------------------------------------------------------

    /// Full name of this context inside its store.
    pub fn name_in_namespace(&self) -> String {
        self.prefix.to_string()
    }

    pub fn compose_name(&self, name: &Name, prefix: &Name) -> Name {
        prefix.join(name)
    }

    /// Release this handle: every later operation through it, or through a
    /// clone of it, fails with [`NamingError::Closed`]. The underlying store
    /// and other views over it stay open; tearing the store down is
    /// [`NamingStore::close`]. Closing twice is allowed.
    pub fn close(&self) -> Result<(), NamingError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(prefix = %self.prefix, "Closed naming context");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for NamingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingContext")
            .field("prefix", &self.prefix.to_string())
            .field("factories", &self.factories)
            .field("max_link_depth", &self.max_link_depth)
            .finish()
    }
}

fn record_lookup(result: &Result<Resolved, NamingError>) {
    let outcome = match result {
        Ok(_) => "found",
        Err(NamingError::NameNotFound { .. }) => "not_found",
        Err(NamingError::LinkDepthExceeded { .. }) => "depth_exceeded",
        Err(_) => "error",
    };
    metrics::counter!("nomen_lookups_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::object_factory::{FnObjectFactory, ObjectFactory};
    use crate::infrastructure::in_memory_store::InMemoryNamingStore;

    fn name(raw: &str) -> Name {
        Name::parse(raw).unwrap()
    }

    fn context() -> NamingContext {
        NamingContext::new(Arc::new(InMemoryNamingStore::new()))
    }

    fn object_at(ctx: &NamingContext, raw: &str) -> Object {
        ctx.lookup(&name(raw))
            .unwrap()
            .into_object()
            .unwrap_or_else(|| panic!("expected object at {}", raw))
    }

    #[test]
    fn test_lookup_returns_same_object() {
        let ctx = context();
        let object = Object::new(vec![1_u8, 2, 3]);
        ctx.bind(&name("java/app/data"), object.clone()).unwrap();
        assert!(object_at(&ctx, "java/app/data").ptr_eq(&object));
    }

    #[test]
    fn test_absolute_link_resolves_to_target() {
        let ctx = context();
        let target = Object::new("db");
        ctx.bind(&name("java/global/ds"), target.clone()).unwrap();
        ctx.bind(&name("java/app/ds"), BoundValue::link("java/global/ds")).unwrap();

        assert!(object_at(&ctx, "java/app/ds").ptr_eq(&target));
    }

    #[test]
    fn test_relative_link_resolves_against_parent() {
        let ctx = context();
        let target = Object::new(1_u16);
        ctx.bind(&name("java/app/real"), target.clone()).unwrap();
        ctx.bind(&name("java/app/alias"), BoundValue::link("./real")).unwrap();

        // from a sub-context view as well
        let app = ctx.lookup(&name("java/app")).unwrap().into_context().unwrap();
        assert!(object_at(&app, "alias").ptr_eq(&target));
    }

    #[test]
    fn test_link_with_remainder() {
        let ctx = context();
        let target = Object::new(3_i8);
        ctx.bind(&name("real/sub/leaf"), target.clone()).unwrap();
        ctx.bind(&name("alias"), BoundValue::link("real")).unwrap();

        assert!(object_at(&ctx, "alias/sub/leaf").ptr_eq(&target));
    }

    #[test]
    fn test_circular_links_exceed_depth() {
        let ctx = context().with_max_link_depth(8);
        ctx.bind(&name("a"), BoundValue::link("b")).unwrap();
        ctx.bind(&name("b"), BoundValue::link("a")).unwrap();

        let err = ctx.lookup(&name("a")).unwrap_err();
        assert!(matches!(err, NamingError::LinkDepthExceeded { limit: 8, .. }));
    }

    #[test]
    fn test_lookup_link_does_not_follow_terminal() {
        let ctx = context();
        ctx.bind(&name("target"), BoundValue::object(1_i32)).unwrap();
        ctx.bind(&name("alias"), BoundValue::link("target")).unwrap();

        match ctx.lookup_link(&name("alias")).unwrap() {
            Resolved::Link(link) => assert_eq!(link.target, "target"),
            other => panic!("expected link, got {:?}", other),
        }
    }

    #[test]
    fn test_object_with_remainder_is_not_context() {
        let ctx = context();
        ctx.bind(&name("leaf"), BoundValue::object(1_i32)).unwrap();
        assert!(matches!(ctx.lookup(&name("leaf/more")), Err(NamingError::NotContext(ref n)) if n == "leaf"));
    }

    #[test]
    fn test_reference_without_factory() {
        let ctx = context();
        let reference = Reference::new("Pool", "pool-factory");
        ctx.bind(&name("pool"), reference.clone()).unwrap();

        match ctx.lookup(&name("pool")).unwrap() {
            Resolved::Reference(found) => assert_eq!(found, reference),
            other => panic!("expected reference, got {:?}", other),
        }
        assert!(matches!(
            ctx.lookup(&name("pool/inner")),
            Err(NamingError::CannotProceed { .. })
        ));
    }

    #[test]
    fn test_reference_through_factory() {
        let mut factories = ObjectFactoryRegistry::new();
        factories.register(
            "greeting",
            Arc::new(FnObjectFactory::new(|reference: &Reference| {
                Ok(BoundValue::object(reference.address("text").unwrap_or_default().to_string()))
            })),
        );
        let ctx = context().with_factories(factories);
        ctx.bind(
            &name("hello"),
            Reference::new("String", "greeting").with_address("text", "hi"),
        )
        .unwrap();

        let object = object_at(&ctx, "hello");
        assert_eq!(object.downcast_ref::<String>().map(String::as_str), Some("hi"));
    }

    #[test]
    fn test_factory_may_return_link() {
        let mut factories = ObjectFactoryRegistry::new();
        factories.register(
            "redirect",
            Arc::new(FnObjectFactory::new(|_reference: &Reference| Ok(BoundValue::link("real")))),
        );
        let ctx = context().with_factories(factories);
        let real = Object::new(9_u64);
        ctx.bind(&name("real"), real.clone()).unwrap();
        ctx.bind(&name("ref"), Reference::new("u64", "redirect")).unwrap();

        assert!(object_at(&ctx, "ref").ptr_eq(&real));
    }

    struct Splitter;

    impl ObjectFactory for Splitter {
        fn get_object_instance(
            &self,
            _reference: &Reference,
            _name: &Name,
            remaining: &Name,
        ) -> Result<FactoryOutcome, NamingError> {
            Ok(FactoryOutcome::Partial {
                resolved: BoundValue::object("remote-root"),
                remaining: remaining.suffix(1),
            })
        }
    }

    #[test]
    fn test_factory_partial_yields_continuation() {
        let mut factories = ObjectFactoryRegistry::new();
        factories.register("remote", Arc::new(Splitter));
        let ctx = context().with_factories(factories);
        ctx.bind(&name("corba"), Reference::new("Orb", "remote")).unwrap();

        match ctx.resolve(&name("corba/a/b")).unwrap() {
            Resolution::Continuation(rest) => {
                assert_eq!(rest.resolved_name, name("corba"));
                assert_eq!(rest.remaining, name("b"));
            }
            other => panic!("expected continuation, got {:?}", other),
        }
        assert!(matches!(
            ctx.lookup(&name("corba/a/b")),
            Err(NamingError::CannotProceed { .. })
        ));
    }

    #[test]
    fn test_federated_context_continues_lookup() {
        let foreign = Arc::new(InMemoryNamingStore::new());
        let target = Object::new(5_i32);
        foreign
            .bind(&name("x/y"), BoundValue::Object(target.clone()), None)
            .unwrap();

        let ctx = context();
        ctx.bind(&name("remote"), BoundValue::Context(foreign)).unwrap();
        assert!(object_at(&ctx, "remote/x/y").ptr_eq(&target));
        assert!(matches!(ctx.lookup(&name("remote/x")).unwrap(), Resolved::Context(_)));
    }

    #[test]
    fn test_list_bindings_materializes_references() {
        let mut factories = ObjectFactoryRegistry::new();
        factories.register(
            "num",
            Arc::new(FnObjectFactory::new(|_reference: &Reference| Ok(BoundValue::object(42_i32)))),
        );
        let ctx = context().with_factories(factories);
        ctx.bind(&name("app/answer"), Reference::new("i32", "num")).unwrap();
        ctx.bind(&name("app/alias"), BoundValue::link("app/answer")).unwrap();
        ctx.bind(&name("app/nested/leaf"), BoundValue::object(())).unwrap();

        let bindings = ctx.list_bindings(&name("app")).unwrap();
        let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["alias", "answer", "nested"]);

        assert!(matches!(bindings[0].value, Resolved::Link(_)));
        assert_eq!(
            bindings[1].value.as_object().and_then(|o| o.downcast_ref::<i32>()),
            Some(&42)
        );
        assert_eq!(bindings[2].class_name, CONTEXT_CLASS);
        match &bindings[2].value {
            Resolved::Context(nested) => assert_eq!(nested.name_in_namespace(), "app/nested"),
            other => panic!("expected context, got {:?}", other),
        }
    }

    #[test]
    fn test_list_on_object_fails() {
        let ctx = context();
        ctx.bind(&name("leaf"), BoundValue::object(1_i32)).unwrap();
        assert!(matches!(ctx.list(&name("leaf")), Err(NamingError::NotContext(_))));
    }

    #[test]
    fn test_subcontext_view_writes_under_prefix() {
        let ctx = context();
        let app = ctx.create_subcontext(&name("java/app")).unwrap();
        assert_eq!(app.name_in_namespace(), "java/app");

        app.bind(&name("x"), BoundValue::object(1_i32)).unwrap();
        assert!(ctx.lookup(&name("java/app/x")).unwrap().as_object().is_some());

        app.rename(&name("x"), &name("y")).unwrap();
        assert!(matches!(ctx.lookup(&name("java/app/x")), Err(NamingError::NameNotFound { .. })));
        assert!(ctx.lookup(&name("java/app/y")).is_ok());

        assert!(matches!(app.bind(&Name::root(), BoundValue::object(1_i32)), Err(NamingError::InvalidName(_))));
    }

    #[test]
    fn test_compose_name() {
        let ctx = context();
        assert_eq!(ctx.compose_name(&name("c"), &name("a/b")), name("a/b/c"));
    }

    #[test]
    fn test_add_listener_requires_coordinator() {
        struct Quiet;
        impl NamingListener for Quiet {}

        let ctx = context();
        let result = ctx.add_listener(&name("a"), EventScope::Object, Arc::new(Quiet));
        assert!(matches!(result, Err(NamingError::ReadOnly { .. })));
    }

    #[test]
    fn test_closed_context_rejects_operations() {
        let ctx = context();
        ctx.bind(&name("a/b"), BoundValue::object(1_i32)).unwrap();
        let sub = ctx.lookup(&name("a")).unwrap().into_context().unwrap();
        let handle = ctx.clone();

        ctx.close().unwrap();
        assert!(ctx.is_closed());
        assert!(handle.is_closed());
        assert!(matches!(ctx.lookup(&name("a/b")), Err(NamingError::Closed)));
        assert!(matches!(handle.list(&Name::root()), Err(NamingError::Closed)));
        assert!(matches!(
            ctx.bind(&name("c"), BoundValue::object(2_i32)),
            Err(NamingError::Closed)
        ));
        assert!(matches!(ctx.unbind(&name("a/b")), Err(NamingError::Closed)));
        ctx.close().unwrap();

        // The store and views opened earlier stay usable.
        assert_eq!(object_at(&sub, "b").downcast_ref::<i32>(), Some(&1));
        sub.bind(&name("c"), BoundValue::object(3_i32)).unwrap();
        let reopened = NamingContext::new(Arc::clone(ctx.store()));
        assert_eq!(object_at(&reopened, "a/c").downcast_ref::<i32>(), Some(&3));
    }
}
