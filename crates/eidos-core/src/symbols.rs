use crate::error::{EidosError, EidosResult};
use crate::interner::{self, ids, string_for_global_id, EidosStringId};
use crate::pool::{self, ValueRc};
use crate::value::EidosValue;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Capacity of the compact array storage; inserting past this migrates the
/// table to hash storage, one-way.
pub const SYMBOL_TABLE_BASE_SIZE: usize = 32;

const SITE_TABLE: &str = "SymbolTable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTableKind {
    IntrinsicConstants,
    DefinedConstants,
    Variables,
}

impl SymbolTableKind {
    pub fn is_constant(self) -> bool {
        !matches!(self, SymbolTableKind::Variables)
    }
}

/// Scopes are linked through shared handles; the host owns the chain and the
/// parent link is a back-reference, never ownership of the child.
pub type ScopeRef = Rc<RefCell<SymbolTable>>;

#[derive(Debug, Clone)]
struct InternalSlot {
    name: EidosStringId,
    value: ValueRc,
}

#[derive(Debug)]
enum SymbolStorage {
    /// Insertion-ordered compact array, scanned back-to-front.
    Internal(Vec<InternalSlot>),
    Hash(FxHashMap<EidosStringId, ValueRc>),
}

/// One scope in the chain: intrinsic constants at the root, optionally a
/// defined-constants table, and a variables table nearest the interpreter.
#[derive(Debug)]
pub struct SymbolTable {
    kind: SymbolTableKind,
    parent: Option<ScopeRef>,
    storage: SymbolStorage,
}

impl SymbolTable {
    /// The root table holding the language's intrinsic constants. There is
    /// exactly one per chain and it never has a parent.
    pub fn new_intrinsic() -> ScopeRef {
        let mut table = SymbolTable {
            kind: SymbolTableKind::IntrinsicConstants,
            parent: None,
            storage: SymbolStorage::Internal(Vec::with_capacity(8)),
        };

        table.initialize_constant_entry(ids::NAN, Rc::new(EidosValue::float(f64::NAN)));
        table.initialize_constant_entry(ids::INF, pool::static_float(f64::INFINITY).unwrap_or_else(|| Rc::new(EidosValue::float(f64::INFINITY))));
        table.initialize_constant_entry(ids::PI, Rc::new(EidosValue::float(std::f64::consts::PI)));
        table.initialize_constant_entry(ids::E, Rc::new(EidosValue::float(std::f64::consts::E)));
        table.initialize_constant_entry(ids::NULL, pool::static_null());
        table.initialize_constant_entry(ids::F, pool::static_logical(false));
        table.initialize_constant_entry(ids::T, pool::static_logical(true));

        Rc::new(RefCell::new(table))
    }

    /// A non-root table. The parent must be a constants table; a variables
    /// parent violates the chain design.
    pub fn new(kind: SymbolTableKind, parent: ScopeRef) -> EidosResult<ScopeRef> {
        if kind == SymbolTableKind::IntrinsicConstants {
            return Err(EidosError::internal(
                SITE_TABLE,
                "the intrinsic constants table cannot have a parent.",
            ));
        }
        if parent.borrow().kind == SymbolTableKind::Variables {
            return Err(EidosError::internal(
                SITE_TABLE,
                "parent symbol tables must be constant in the current design.",
            ));
        }

        Ok(Rc::new(RefCell::new(SymbolTable {
            kind,
            parent: Some(parent),
            storage: SymbolStorage::Internal(Vec::new()),
        })))
    }

    pub fn new_variables(parent: ScopeRef) -> EidosResult<ScopeRef> {
        SymbolTable::new(SymbolTableKind::Variables, parent)
    }

    pub fn new_defined_constants(parent: ScopeRef) -> EidosResult<ScopeRef> {
        SymbolTable::new(SymbolTableKind::DefinedConstants, parent)
    }

    pub fn kind(&self) -> SymbolTableKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ScopeRef> {
        self.parent.clone()
    }

    fn find_local(&self, name: EidosStringId) -> Option<ValueRc> {
        match &self.storage {
            SymbolStorage::Internal(slots) => slots
                .iter()
                .rev()
                .find(|slot| slot.name == name)
                .map(|slot| Rc::clone(&slot.value)),
            SymbolStorage::Hash(map) => map.get(&name).map(Rc::clone),
        }
    }

    /// True if this scope or any ancestor holds the symbol.
    pub fn contains_symbol(&self, name: EidosStringId) -> bool {
        if self.find_local(name).is_some() {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow().contains_symbol(name),
            None => false,
        }
    }

    /// Walk self to root; fails with *undefined identifier* at the root.
    pub fn get_value(&self, name: EidosStringId) -> EidosResult<ValueRc> {
        self.get_value_with_constness(name).map(|(value, _)| value)
    }

    /// Same as `get_value`, additionally reporting whether the hit came from
    /// a constant scope.
    pub fn get_value_with_constness(
        &self,
        name: EidosStringId,
    ) -> EidosResult<(ValueRc, bool)> {
        if let Some(value) = self.find_local(name) {
            return Ok((value, self.kind.is_constant()));
        }
        match &self.parent {
            Some(parent) => parent.borrow().get_value_with_constness(name),
            None => Err(EidosError::undefined_identifier(
                "SymbolTable::get_value",
                string_for_global_id(name),
            )),
        }
    }

    /// One-way migration from the compact array to hash storage.
    fn switch_to_hash(&mut self) {
        if let SymbolStorage::Internal(slots) = &mut self.storage {
            let mut map = FxHashMap::with_capacity_and_hasher(slots.len() * 2, Default::default());
            for slot in slots.drain(..) {
                map.insert(slot.name, slot.value);
            }
            self.storage = SymbolStorage::Hash(map);
        }
    }

    fn insert_local(&mut self, name: EidosStringId, value: ValueRc) {
        let overflow = match &mut self.storage {
            SymbolStorage::Internal(slots) => {
                if let Some(slot) = slots.iter_mut().rev().find(|slot| slot.name == name) {
                    slot.value = value;
                    return;
                }
                if slots.len() < SYMBOL_TABLE_BASE_SIZE {
                    slots.push(InternalSlot { name, value });
                    return;
                }
                value
            }
            SymbolStorage::Hash(map) => {
                map.insert(name, value);
                return;
            }
        };

        self.switch_to_hash();
        if let SymbolStorage::Hash(map) = &mut self.storage {
            map.insert(name, overflow);
        }
    }

    fn check_not_shadowing_constant(&self, name: EidosStringId) -> EidosResult<()> {
        // A symbol held by any ancestor is necessarily a constant in the
        // current chain design.
        if let Some(parent) = &self.parent {
            if parent.borrow().contains_symbol(name) {
                return Err(EidosError::redefinition_of_constant(
                    "SymbolTable::set_value",
                    string_for_global_id(name),
                ));
            }
        }
        Ok(())
    }

    /// Upsert into this variables scope. The value is copied unless it is
    /// uniquely owned and visible, so the table never holds a reference
    /// someone else could mutate under it, and never holds an invisible
    /// value.
    pub fn set_value(&mut self, name: EidosStringId, value: ValueRc) -> EidosResult<()> {
        let value = if !pool::is_unique(&value) || value.is_invisible() {
            Rc::new(value.copy_values())
        } else {
            value
        };
        self.set_value_no_copy_internal(name, value)
    }

    /// The no-copy write path used by the interpreter for the for-loop
    /// induction variable. The caller warrants unique ownership; invisible
    /// values are rejected outright.
    pub fn set_value_no_copy(&mut self, name: EidosStringId, value: ValueRc) -> EidosResult<()> {
        if value.is_invisible() {
            return Err(EidosError::internal(
                SITE_TABLE,
                "no copy requested with invisible value.",
            ));
        }
        self.set_value_no_copy_internal(name, value)
    }

    fn set_value_no_copy_internal(
        &mut self,
        name: EidosStringId,
        value: ValueRc,
    ) -> EidosResult<()> {
        if self.kind != SymbolTableKind::Variables {
            return Err(EidosError::internal(
                SITE_TABLE,
                "symbol writes must target a variables table.",
            ));
        }
        if self.find_local(name).is_none() {
            self.check_not_shadowing_constant(name)?;
        }
        self.insert_local(name, value);
        Ok(())
    }

    /// Exclusive access to the stored value for in-place mutation, reifying
    /// a unique copy first when the slot is shared (copy-on-write). Only a
    /// variables-table binding can be mutated; a hit in an ancestor scope is
    /// a constant by construction.
    pub fn value_mut(&mut self, name: EidosStringId) -> EidosResult<&mut EidosValue> {
        if self.kind != SymbolTableKind::Variables {
            return Err(EidosError::internal(
                SITE_TABLE,
                "symbol mutation must target a variables table.",
            ));
        }

        let found = self.find_local(name).is_some();
        if !found {
            if self
                .parent
                .as_ref()
                .map(|p| p.borrow().contains_symbol(name))
                .unwrap_or(false)
            {
                return Err(EidosError::redefinition_of_constant(
                    "SymbolTable::value_mut",
                    string_for_global_id(name),
                ));
            }
            return Err(EidosError::undefined_identifier(
                "SymbolTable::value_mut",
                string_for_global_id(name),
            ));
        }

        match &mut self.storage {
            SymbolStorage::Internal(slots) => {
                let slot = slots
                    .iter_mut()
                    .rev()
                    .find(|slot| slot.name == name)
                    .expect("slot vanished between lookup and mutation");
                Ok(Rc::make_mut(&mut slot.value))
            }
            SymbolStorage::Hash(map) => {
                let value = map
                    .get_mut(&name)
                    .expect("slot vanished between lookup and mutation");
                Ok(Rc::make_mut(value))
            }
        }
    }

    /// Install a constant binding without any checks; used only while
    /// populating constants tables, where the caller guarantees the name is
    /// fresh and the value visible.
    pub fn initialize_constant_entry(&mut self, name: EidosStringId, value: ValueRc) {
        debug_assert!(
            !value.is_invisible(),
            "constants must be initialized from visible values"
        );
        debug_assert!(
            self.kind.is_constant(),
            "constant initialization on a variables table"
        );
        self.insert_local(name, value);
    }

    /// Remove from the nearest scope holding the symbol. Intrinsic constants
    /// may never be removed; other constants only with `allow_constant`.
    /// Removing a name that is bound nowhere is a no-op.
    pub fn remove_symbol(&mut self, name: EidosStringId, allow_constant: bool) -> EidosResult<()> {
        let found_local = self.find_local(name).is_some();

        if found_local {
            if self.kind.is_constant() {
                if self.kind == SymbolTableKind::IntrinsicConstants {
                    return Err(EidosError::runtime(
                        "SymbolTable::remove_symbol",
                        format!(
                            "identifier '{}' is an intrinsic Eidos constant and thus cannot be removed.",
                            string_for_global_id(name)
                        ),
                    ));
                }
                if !allow_constant {
                    return Err(EidosError::runtime(
                        "SymbolTable::remove_symbol",
                        format!(
                            "identifier '{}' is a constant and thus cannot be removed.",
                            string_for_global_id(name)
                        ),
                    ));
                }
            }

            match &mut self.storage {
                SymbolStorage::Internal(slots) => {
                    if let Some(index) = slots.iter().rposition(|slot| slot.name == name) {
                        slots.swap_remove(index);
                    }
                }
                SymbolStorage::Hash(map) => {
                    map.remove(&name);
                }
            }
            return Ok(());
        }

        if let Some(parent) = &self.parent {
            return parent.borrow_mut().remove_symbol(name, allow_constant);
        }
        Ok(())
    }

    /// All bound names, assembled root-first so parent names precede local
    /// names.
    pub fn symbol_names(
        &self,
        include_constants: bool,
        include_variables: bool,
    ) -> Vec<Arc<String>> {
        let mut names = match &self.parent {
            Some(parent) => parent
                .borrow()
                .symbol_names(include_constants, include_variables),
            None => Vec::new(),
        };

        let included = if self.kind.is_constant() {
            include_constants
        } else {
            include_variables
        };

        if included {
            match &self.storage {
                SymbolStorage::Internal(slots) => {
                    for slot in slots {
                        names.push(string_for_global_id(slot.name));
                    }
                }
                SymbolStorage::Hash(map) => {
                    for name in map.keys() {
                        names.push(string_for_global_id(*name));
                    }
                }
            }
        }

        names
    }

    /// True once the one-way migration to hash storage has happened.
    pub fn is_using_hash_storage(&self) -> bool {
        matches!(self.storage, SymbolStorage::Hash(_))
    }
}

/// Install a defined constant somewhere in `table`'s chain. A
/// *DefinedConstants* table is located by walking the parent chain; when the
/// chain has none, one is spliced in between the intrinsic constants table
/// and its nearest child. Fails if the name is bound anywhere in the chain.
pub fn define_constant_for_symbol(
    table: &ScopeRef,
    name: EidosStringId,
    value: ValueRc,
) -> EidosResult<()> {
    if table.borrow().contains_symbol(name) {
        return Err(EidosError::runtime(
            "SymbolTable::define_constant_for_symbol",
            format!("identifier '{}' is already defined.", string_for_global_id(name)),
        ));
    }

    // Search the chain for an existing defined-constants table.
    let mut cursor = Some(Rc::clone(table));
    let mut defined_table: Option<ScopeRef> = None;
    while let Some(current) = cursor {
        if current.borrow().kind == SymbolTableKind::DefinedConstants {
            defined_table = Some(current);
            break;
        }
        cursor = current.borrow().parent();
    }

    let defined_table = match defined_table {
        Some(found) => found,
        None => {
            // Find the child of the intrinsic constants table and splice a
            // new defined-constants table in between.
            let mut child = Rc::clone(table);
            loop {
                let parent = child.borrow().parent();
                match parent {
                    Some(parent) => {
                        if parent.borrow().kind == SymbolTableKind::IntrinsicConstants {
                            let spliced = SymbolTable::new_defined_constants(parent)?;
                            child.borrow_mut().parent = Some(Rc::clone(&spliced));
                            break spliced;
                        }
                        child = parent;
                    }
                    None => {
                        return Err(EidosError::internal(
                            "SymbolTable::define_constant_for_symbol",
                            "could not find child symbol table of the intrinsic constants table.",
                        ));
                    }
                }
            }
        }
    };

    let value = if !pool::is_unique(&value) || value.is_invisible() {
        Rc::new(value.copy_values())
    } else {
        value
    };

    defined_table
        .borrow_mut()
        .initialize_constant_entry(name, value);
    Ok(())
}

/// Convenience for hosts and tests: intern `name` and define the constant.
pub fn define_constant_named(table: &ScopeRef, name: &str, value: ValueRc) -> EidosResult<()> {
    define_constant_for_symbol(table, interner::global_id_for_string(name), value)
}
