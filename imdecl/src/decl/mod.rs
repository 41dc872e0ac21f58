//! Read-only model of the analyzed code base.
//!
//! A front end fills a [`DeclarationGraph`] with types, their nested types,
//! fields, constructors, methods and parameters. Sibling lists keep insertion
//! order; that order is what structural paths index into, so it must be the
//! same every time the same code base is loaded.

mod types;

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use bitflags::bitflags;
use log::debug;
use strum::{Display, EnumIs};

pub use types::{Primitive, STRING_LIKE, TypeBase, TypeRef};

use crate::marker::Marker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub u32);

macro_rules! arena_id {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(TypeId, "type#");
arena_id!(MethodId, "method#");
arena_id!(FieldId, "field#");

/// A parameter: the owning method or constructor plus the parameter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamRef {
    pub method: MethodId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeclKind {
    Type,
    Method,
    Field,
    Parameter,
}

/// Any declaration a property map can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum Declaration {
    Type(TypeId),
    Method(MethodId),
    Field(FieldId),
    Parameter(ParamRef),
}

impl Declaration {
    pub fn kind(&self) -> DeclKind {
        match self {
            Declaration::Type(_) => DeclKind::Type,
            Declaration::Method(_) => DeclKind::Method,
            Declaration::Field(_) => DeclKind::Field,
            Declaration::Parameter(_) => DeclKind::Parameter,
        }
    }
}

impl From<TypeId> for Declaration {
    fn from(id: TypeId) -> Self {
        Declaration::Type(id)
    }
}

impl From<MethodId> for Declaration {
    fn from(id: MethodId) -> Self {
        Declaration::Method(id)
    }
}

impl From<FieldId> for Declaration {
    fn from(id: FieldId) -> Self {
        Declaration::Field(id)
    }
}

impl From<ParamRef> for Declaration {
    fn from(param: ParamRef) -> Self {
        Declaration::Parameter(param)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const STATIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        const FINAL = 1 << 2;
        const SEALED = 1 << 3;
        /// Compiler generated, e.g. the constants of an enum.
        const SYNTHETIC = 1 << 4;
        const DEFAULT = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIs)]
pub enum Access {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIs)]
pub enum TypeNature {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum MethodKind {
    Constructor,
    Method,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub simple_name: String,
    pub package: String,
    pub fqn: String,
    pub enclosing: Option<TypeId>,
    pub nature: TypeNature,
    pub access: Access,
    pub modifiers: Modifiers,
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub subtypes: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub constructors: Vec<MethodId>,
    pub methods: Vec<MethodId>,
    pub markers: Vec<Marker>,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub owner: TypeId,
    pub kind: MethodKind,
    pub access: Access,
    pub modifiers: Modifiers,
    /// `void` for constructors.
    pub return_type: TypeRef,
    pub params: Vec<ParamDecl>,
    pub markers: Vec<Marker>,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
    pub markers: Vec<Marker>,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub owner: TypeId,
    pub ty: TypeRef,
    pub access: Access,
    pub modifiers: Modifiers,
    /// Initializer, when it is a string constant.
    pub constant: Option<String>,
    pub markers: Vec<Marker>,
    pub comments: Vec<String>,
}

/// Resolves fully qualified type names to types of a graph.
pub trait TypeResolver {
    fn resolve_fqn(&self, fqn: &str) -> Option<TypeId>;
}

/// Arena holding every declaration of a loaded code base.
#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    types: Vec<TypeDecl>,
    methods: Vec<MethodDecl>,
    fields: Vec<FieldDecl>,
    fqn_index: HashMap<String, TypeId>,
}

impl DeclarationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a public top-level class.
    pub fn add_type(&mut self, package: &str, simple_name: &str) -> TypeId {
        let fqn = if package.is_empty() {
            simple_name.to_string()
        } else {
            format!("{package}.{simple_name}")
        };
        self.push_type(package, simple_name, fqn, None)
    }

    /// Adds a public nested class to `enclosing`.
    pub fn add_subtype(&mut self, enclosing: TypeId, simple_name: &str) -> TypeId {
        let outer = self.ty(enclosing);
        let fqn = format!("{}.{}", outer.fqn, simple_name);
        let package = outer.package.clone();
        let id = self.push_type(&package, simple_name, fqn, Some(enclosing));
        self.types[enclosing.index()].subtypes.push(id);
        id
    }

    fn push_type(
        &mut self,
        package: &str,
        simple_name: &str,
        fqn: String,
        enclosing: Option<TypeId>,
    ) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        if let Some(previous) = self.fqn_index.insert(fqn.clone(), id) {
            debug!("Type {fqn} redeclared, {previous} is shadowed by {id}");
        }
        self.types.push(TypeDecl {
            simple_name: simple_name.to_string(),
            package: package.to_string(),
            fqn,
            enclosing,
            nature: TypeNature::Class,
            access: Access::Public,
            modifiers: Modifiers::empty(),
            parent: None,
            interfaces: Vec::new(),
            subtypes: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            markers: Vec::new(),
            comments: Vec::new(),
        });
        id
    }

    /// Adds a public constructor without parameters.
    pub fn add_constructor(&mut self, owner: TypeId) -> MethodId {
        let id = self.push_method(owner, "<init>", MethodKind::Constructor, TypeRef::void());
        self.types[owner.index()].constructors.push(id);
        id
    }

    /// Adds a public instance method without parameters.
    pub fn add_method(&mut self, owner: TypeId, name: &str, return_type: TypeRef) -> MethodId {
        let id = self.push_method(owner, name, MethodKind::Method, return_type);
        self.types[owner.index()].methods.push(id);
        id
    }

    fn push_method(
        &mut self,
        owner: TypeId,
        name: &str,
        kind: MethodKind,
        return_type: TypeRef,
    ) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(MethodDecl {
            name: name.to_string(),
            owner,
            kind,
            access: Access::Public,
            modifiers: Modifiers::empty(),
            return_type,
            params: Vec::new(),
            markers: Vec::new(),
            comments: Vec::new(),
        });
        id
    }

    pub fn add_parameter(&mut self, method: MethodId, name: &str, ty: TypeRef) -> ParamRef {
        let params = &mut self.methods[method.index()].params;
        params.push(ParamDecl {
            name: name.to_string(),
            ty,
            markers: Vec::new(),
            comments: Vec::new(),
        });
        ParamRef {
            method,
            index: params.len() - 1,
        }
    }

    /// Adds a public, non-final instance field.
    pub fn add_field(&mut self, owner: TypeId, name: &str, ty: TypeRef) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(FieldDecl {
            name: name.to_string(),
            owner,
            ty,
            access: Access::Public,
            modifiers: Modifiers::empty(),
            constant: None,
            markers: Vec::new(),
            comments: Vec::new(),
        });
        self.types[owner.index()].fields.push(id);
        id
    }

    pub fn ty(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.index()]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut TypeDecl {
        &mut self.types[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.index()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDecl {
        &mut self.methods[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.index()]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut FieldDecl {
        &mut self.fields[id.index()]
    }

    pub fn param(&self, param: ParamRef) -> &ParamDecl {
        &self.methods[param.method.index()].params[param.index]
    }

    pub fn param_mut(&mut self, param: ParamRef) -> &mut ParamDecl {
        &mut self.methods[param.method.index()].params[param.index]
    }

    pub fn params(&self, method: MethodId) -> impl Iterator<Item = ParamRef> + '_ {
        (0..self.method(method).params.len()).map(move |index| ParamRef { method, index })
    }

    /// Markers declared directly on a declaration.
    pub fn markers(&self, decl: Declaration) -> &[Marker] {
        match decl {
            Declaration::Type(id) => &self.ty(id).markers,
            Declaration::Method(id) => &self.method(id).markers,
            Declaration::Field(id) => &self.field(id).markers,
            Declaration::Parameter(p) => &self.param(p).markers,
        }
    }

    pub fn comments(&self, decl: Declaration) -> &[String] {
        match decl {
            Declaration::Type(id) => &self.ty(id).comments,
            Declaration::Method(id) => &self.method(id).comments,
            Declaration::Field(id) => &self.field(id).comments,
            Declaration::Parameter(p) => &self.param(p).comments,
        }
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(|i| TypeId(i as u32))
    }

    /// Top-level types, in declaration order.
    pub fn primary_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.type_ids().filter(|id| self.ty(*id).enclosing.is_none())
    }

    pub fn primary_type_of(&self, mut id: TypeId) -> TypeId {
        while let Some(outer) = self.ty(id).enclosing {
            id = outer;
        }
        id
    }

    pub fn type_by_fqn(&self, fqn: &str) -> Option<TypeId> {
        self.fqn_index.get(fqn).copied()
    }

    /// The declared type a reference is built on, when it is part of this graph.
    pub fn resolve(&self, ty: &TypeRef) -> Option<TypeId> {
        ty.best_type_fqn().and_then(|fqn| self.type_by_fqn(fqn))
    }

    /// Parent class first, then interfaces in declaration order; unknown types are skipped.
    pub fn direct_super_types(&self, id: TypeId) -> Vec<TypeId> {
        let decl = self.ty(id);
        decl.parent
            .iter()
            .chain(decl.interfaces.iter())
            .filter_map(|t| self.resolve(t))
            .collect()
    }

    /// Every supertype reachable from `id`, depth first.
    ///
    /// A supertype reached along several paths is listed once per path, which
    /// is what edge multiplicities count. Types already on the current path
    /// are not entered again, so cyclic declarations terminate.
    pub fn recursive_super_types(&self, id: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut path = vec![id];
        self.collect_super_types(id, &mut path, &mut out);
        out
    }

    fn collect_super_types(&self, id: TypeId, path: &mut Vec<TypeId>, out: &mut Vec<TypeId>) {
        for sup in self.direct_super_types(id) {
            if path.contains(&sup) {
                continue;
            }
            out.push(sup);
            path.push(sup);
            self.collect_super_types(sup, path, out);
            path.pop();
        }
    }

    /// `id` followed by all of its nested types, depth first.
    pub fn recursive_subtypes(&self, id: TypeId) -> Vec<TypeId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            let nested = &self.ty(current).subtypes;
            out.splice(i + 1..i + 1, nested.iter().copied());
            i += 1;
        }
        out
    }

    pub fn is_public(&self, id: TypeId) -> bool {
        self.ty(id).access.is_public()
    }

    /// Public, and nested only in publicly accessible types.
    pub fn is_type_publicly_accessible(&self, id: TypeId) -> bool {
        let decl = self.ty(id);
        decl.access.is_public()
            && decl
                .enclosing
                .is_none_or(|outer| self.is_type_publicly_accessible(outer))
    }

    pub fn is_method_publicly_accessible(&self, id: MethodId) -> bool {
        let method = self.method(id);
        let owner = self.ty(method.owner);
        let visible = method.access.is_public()
            || (owner.nature.is_interface() && !method.access.is_private());
        visible && self.is_type_publicly_accessible(method.owner)
    }

    pub fn is_field_publicly_accessible(&self, id: FieldId) -> bool {
        let field = self.field(id);
        field.access.is_public() && self.is_type_publicly_accessible(field.owner)
    }

    pub fn is_publicly_accessible(&self, decl: Declaration) -> bool {
        match decl {
            Declaration::Type(id) => self.is_type_publicly_accessible(id),
            Declaration::Method(id) => self.is_method_publicly_accessible(id),
            Declaration::Field(id) => self.is_field_publicly_accessible(id),
            Declaration::Parameter(p) => self.is_method_publicly_accessible(p.method),
        }
    }

    /// Whether other code can add subtypes of this type.
    pub fn is_extensible(&self, id: TypeId) -> bool {
        let decl = self.ty(id);
        match decl.nature {
            TypeNature::Interface => true,
            TypeNature::Enum | TypeNature::Record | TypeNature::Annotation => false,
            TypeNature::Class => {
                decl.modifiers.contains(Modifiers::ABSTRACT)
                    || !decl
                        .modifiers
                        .intersects(Modifiers::FINAL | Modifiers::SEALED)
            }
        }
    }

    pub fn field_by_name(&self, owner: TypeId, name: &str) -> Option<FieldId> {
        self.ty(owner)
            .fields
            .iter()
            .copied()
            .find(|f| self.field(*f).name == name)
    }

    pub fn find_subtype(&self, owner: TypeId, simple_name: &str) -> Option<TypeId> {
        self.ty(owner)
            .subtypes
            .iter()
            .copied()
            .find(|t| self.ty(*t).simple_name == simple_name)
    }

    /// Constructors first, then methods.
    pub fn constructors_and_methods(&self, owner: TypeId) -> impl Iterator<Item = MethodId> + '_ {
        let decl = self.ty(owner);
        decl.constructors
            .iter()
            .chain(decl.methods.iter())
            .copied()
    }

    pub fn is_constructor(&self, id: MethodId) -> bool {
        self.method(id).kind.is_constructor()
    }

    pub fn is_static(&self, id: MethodId) -> bool {
        self.method(id).modifiers.contains(Modifiers::STATIC)
    }

    /// Whether the method returns an instance of its own type.
    pub fn returns_owner(&self, id: MethodId) -> bool {
        let method = self.method(id);
        method.return_type.arrays == 0
            && method.return_type.best_type_fqn() == Some(self.ty(method.owner).fqn.as_str())
    }

    /// A static method producing an instance of its own type.
    pub fn is_factory_method(&self, id: MethodId) -> bool {
        !self.is_constructor(id) && self.is_static(id) && self.returns_owner(id)
    }

    /// Methods of supertypes that this method overrides.
    ///
    /// Matches on name, parameter count and parameter-type compatibility.
    /// Constructors and static methods override nothing.
    pub fn overrides(&self, id: MethodId) -> Vec<MethodId> {
        let method = self.method(id);
        if method.kind.is_constructor() || method.modifiers.contains(Modifiers::STATIC) {
            return Vec::new();
        }
        let supertypes: BTreeSet<TypeId> =
            self.recursive_super_types(method.owner).into_iter().collect();
        supertypes
            .into_iter()
            .flat_map(|sup| self.ty(sup).methods.iter().copied())
            .filter(|candidate| {
                let other = self.method(*candidate);
                !other.modifiers.contains(Modifiers::STATIC)
                    && other.name == method.name
                    && other.params.len() == method.params.len()
                    && other
                        .params
                        .iter()
                        .zip(method.params.iter())
                        .all(|(a, b)| a.ty.is_transfer_compatible(&b.ty))
            })
            .collect()
    }

    /// `name(type,type)`; the name is `<init>` for constructors.
    pub fn method_signature(&self, id: MethodId) -> String {
        let method = self.method(id);
        let params: Vec<String> = method.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", method.name, params.join(","))
    }

    /// The type a declaration belongs to; a type belongs to itself.
    pub fn owning_type(&self, decl: Declaration) -> TypeId {
        match decl {
            Declaration::Type(id) => id,
            Declaration::Method(id) => self.method(id).owner,
            Declaration::Field(id) => self.field(id).owner,
            Declaration::Parameter(p) => self.method(p.method).owner,
        }
    }

    /// Human readable name of a declaration, for diagnostics.
    pub fn describe(&self, decl: Declaration) -> String {
        match decl {
            Declaration::Type(id) => self.ty(id).fqn.clone(),
            Declaration::Method(id) => {
                format!(
                    "{}.{}",
                    self.ty(self.method(id).owner).fqn,
                    self.method_signature(id)
                )
            }
            Declaration::Field(id) => {
                let field = self.field(id);
                format!("{}.{}", self.ty(field.owner).fqn, field.name)
            }
            Declaration::Parameter(p) => format!(
                "{}#{}:{}",
                self.describe(Declaration::Method(p.method)),
                p.index,
                self.param(p).name
            ),
        }
    }
}

impl TypeResolver for DeclarationGraph {
    fn resolve_fqn(&self, fqn: &str) -> Option<TypeId> {
        self.type_by_fqn(fqn)
    }
}
