use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::lingo::datum::{Datum, MemberRef};
use crate::movie::ScriptContext;
use crate::movie::chunks::cast_member::ScriptKind;
use crate::movie::chunks::handler::HandlerDef;

use super::ScriptError;

/// A handler with its names pre-resolved through the context table, so
/// execution never touches name ids.
pub struct ScriptHandler {
    pub name: String,
    pub argument_names: Vec<String>,
    pub local_names: Vec<String>,
    pub global_names: Vec<String>,
    pub def: HandlerDef,
}

/// A loaded script member. The kind comes from the owning cast member,
/// which is authoritative; the intra-chunk kind field is not.
pub struct Script {
    pub member_ref: MemberRef,
    pub name: String,
    pub kind: ScriptKind,
    pub literals: Vec<Datum>,
    pub property_names: Vec<String>,
    pub global_names: Vec<String>,
    pub handlers: Vec<Rc<ScriptHandler>>,
    /// the shared names table of the owning context; symbol/name operands
    /// resolve through it at execution time
    pub context_names: Rc<Vec<String>>,
    /// bytecode variable indices are scaled by this per-context factor
    pub variable_multiplier: u32,
    /// script id inside its context, used as the debugger's script key
    pub script_number: u16,
    /// property storage for handlers running without a receiver
    pub static_props: RefCell<FxHashMap<String, Datum>>,
}

impl Script {
    pub fn from_chunk(
        member_ref: MemberRef,
        name: String,
        kind: ScriptKind,
        chunk: &crate::movie::chunks::script::ScriptChunk,
        lctx: &ScriptContext,
        context_names: Rc<Vec<String>>,
        variable_multiplier: u32,
    ) -> Script {
        let handlers = chunk
            .handlers
            .iter()
            .map(|def| {
                Rc::new(ScriptHandler {
                    name: lctx.resolve_name(def.name_id),
                    argument_names: def
                        .argument_name_ids
                        .iter()
                        .map(|&id| lctx.resolve_name(id))
                        .collect(),
                    local_names: def
                        .local_name_ids
                        .iter()
                        .map(|&id| lctx.resolve_name(id))
                        .collect(),
                    global_names: def
                        .global_name_ids
                        .iter()
                        .map(|&id| lctx.resolve_name(id))
                        .collect(),
                    def: def.clone(),
                })
            })
            .collect_vec();

        Script {
            member_ref,
            name,
            kind,
            literals: chunk.literals.clone(),
            property_names: chunk
                .property_name_ids
                .iter()
                .map(|&id| lctx.resolve_name(id))
                .collect(),
            global_names: chunk
                .global_name_ids
                .iter()
                .map(|&id| lctx.resolve_name(id))
                .collect(),
            handlers,
            context_names,
            variable_multiplier,
            script_number: chunk.script_number,
            static_props: RefCell::new(FxHashMap::default()),
        }
    }

    /// Missing ids resolve to a `#<id>` sentinel rather than failing.
    pub fn resolve_name(&self, name_id: u16) -> String {
        self.context_names
            .get(name_id as usize)
            .cloned()
            .unwrap_or_else(|| format!("#{}", name_id))
    }

    pub fn handler_named(&self, name: &str) -> Option<Rc<ScriptHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn handler_at(&self, index: usize) -> Option<Rc<ScriptHandler>> {
        self.handlers.get(index).cloned()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handler_named(name).is_some()
    }
}

pub type HandlerRef = (MemberRef, String);

pub struct ScriptInstance {
    pub instance_id: u32,
    pub script: MemberRef,
    pub ancestor: Option<ScriptInstanceRef>,
    pub properties: FxHashMap<String, Datum>,
}

impl ScriptInstance {
    pub fn new(instance_id: u32, script_ref: MemberRef, script: &Script) -> ScriptInstance {
        let mut properties = FxHashMap::default();
        for name in &script.property_names {
            properties.insert(name.clone(), Datum::Void);
        }
        ScriptInstance {
            instance_id,
            script: script_ref,
            ancestor: None,
            properties,
        }
    }
}

impl fmt::Debug for ScriptInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ancestors may form cycles; never recurse here
        write!(f, "ScriptInstance#{}", self.instance_id)
    }
}

/// Shared handle to a script instance. Equality is identity: two handles
/// are equal when they point at the same instance.
#[derive(Clone)]
pub struct ScriptInstanceRef(Rc<RefCell<ScriptInstance>>);

impl ScriptInstanceRef {
    pub fn new(instance: ScriptInstance) -> ScriptInstanceRef {
        ScriptInstanceRef(Rc::new(RefCell::new(instance)))
    }
}

impl Deref for ScriptInstanceRef {
    type Target = Rc<RefCell<ScriptInstance>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for ScriptInstanceRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ScriptInstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(instance) => write!(f, "{:?}", instance),
            Err(_) => write!(f, "ScriptInstance<borrowed>"),
        }
    }
}

/// Missing-property lookups walk the ancestor chain. The chain is bounded;
/// legal movies occasionally loop an ancestor back at itself.
pub const MAX_ANCESTOR_HOPS: usize = 20;

pub fn instance_get_prop_opt(instance_ref: &ScriptInstanceRef, prop_name: &str) -> Option<Datum> {
    let mut current = instance_ref.clone();
    for _ in 0..=MAX_ANCESTOR_HOPS {
        if prop_name.eq_ignore_ascii_case("ancestor") {
            return Some(match &current.borrow().ancestor {
                Some(ancestor) => Datum::Instance(ancestor.clone()),
                None => Datum::Void,
            });
        }
        {
            let instance = current.borrow();
            if let Some(value) = instance.properties.get(prop_name) {
                return Some(value.clone());
            }
            // property names are case-insensitive at the script surface
            if let Some((_, value)) = instance
                .properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(prop_name))
            {
                return Some(value.clone());
            }
        }
        let ancestor = current.borrow().ancestor.clone();
        match ancestor {
            Some(next) => current = next,
            None => return None,
        }
    }
    None
}

pub fn instance_get_prop(
    instance_ref: &ScriptInstanceRef,
    prop_name: &str,
) -> Result<Datum, ScriptError> {
    instance_get_prop_opt(instance_ref, prop_name).ok_or_else(|| {
        ScriptError::new(format!(
            "No property {} on script instance #{}",
            prop_name,
            instance_ref.borrow().instance_id
        ))
    })
}

/// Sets walk the chain like gets; a name missing everywhere lands on the
/// instance itself unless `required` is set.
pub fn instance_set_prop(
    instance_ref: &ScriptInstanceRef,
    prop_name: &str,
    value: Datum,
    required: bool,
) -> Result<(), ScriptError> {
    if prop_name.eq_ignore_ascii_case("ancestor") {
        let ancestor = match &value {
            Datum::Instance(ancestor) => Some(ancestor.clone()),
            Datum::Void => None,
            _ => {
                return Err(ScriptError::new(format!(
                    "ancestor must be a script instance, got {}",
                    value.type_str()
                )));
            }
        };
        instance_ref.borrow_mut().ancestor = ancestor;
        return Ok(());
    }

    let mut current = instance_ref.clone();
    for _ in 0..=MAX_ANCESTOR_HOPS {
        {
            let mut instance = current.borrow_mut();
            let existing_key = instance
                .properties
                .keys()
                .find(|key| key.eq_ignore_ascii_case(prop_name))
                .cloned();
            if let Some(key) = existing_key {
                instance.properties.insert(key, value);
                return Ok(());
            }
        }
        let ancestor = current.borrow().ancestor.clone();
        match ancestor {
            Some(next) => current = next,
            None => break,
        }
    }

    if required {
        Err(ScriptError::new(format!(
            "No property {} on script instance #{}",
            prop_name,
            instance_ref.borrow().instance_id
        )))
    } else {
        instance_ref
            .borrow_mut()
            .properties
            .insert(prop_name.to_string(), value);
        Ok(())
    }
}

/// Resolves a handler name through the instance's script, then up the
/// ancestor chain. Returns the receiver the handler should run against.
pub fn find_instance_handler(
    instance_ref: &ScriptInstanceRef,
    handler_name: &str,
    scripts: &dyn Fn(&MemberRef) -> Option<Rc<Script>>,
) -> Option<(ScriptInstanceRef, HandlerRef)> {
    let mut current = instance_ref.clone();
    for _ in 0..=MAX_ANCESTOR_HOPS {
        let script_ref = current.borrow().script.clone();
        if let Some(script) = scripts(&script_ref) {
            if let Some(handler) = script.handler_named(handler_name) {
                return Some((current.clone(), (script_ref, handler.name.clone())));
            }
        }
        let ancestor = current.borrow().ancestor.clone();
        match ancestor {
            Some(next) => current = next,
            None => return None,
        }
    }
    None
}
