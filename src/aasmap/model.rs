//! The Asset Administration Shell type library and its editor metadata.
//!
//! Only the parts the import feature works with are described: identifiers,
//! references, submodels and the common submodel elements. Each class lists
//! its constructor parameters in the order the constructor takes them.

use crate::registry::{ClassInfo, PackViewAttr, Target};
use crate::types::{ClassDef, EnumDef, Literal, ParamDef, TypeRef};

pub static MODELING_KIND: EnumDef = EnumDef {
    name: "ModelingKind",
    variants: &["TEMPLATE", "INSTANCE"],
};

pub static IDENTIFIER_TYPE: EnumDef = EnumDef {
    name: "IdentifierType",
    variants: &["IRDI", "IRI", "CUSTOM"],
};

pub static ASSET_KIND: EnumDef = EnumDef {
    name: "AssetKind",
    variants: &["TYPE", "INSTANCE"],
};

pub static KEY_ELEMENTS: EnumDef = EnumDef {
    name: "KeyElements",
    variants: &[
        "ASSET",
        "ASSET_ADMINISTRATION_SHELL",
        "CONCEPT_DESCRIPTION",
        "SUBMODEL",
        "PROPERTY",
        "SUBMODEL_ELEMENT_COLLECTION",
        "GLOBAL_REFERENCE",
    ],
};

pub static KEY_TYPE: EnumDef = EnumDef {
    name: "KeyType",
    variants: &["IRDI", "IRI", "CUSTOM", "IDSHORT", "FRAGMENT_ID"],
};

pub static REFERABLE: ClassDef = ClassDef {
    name: "Referable",
    base: None,
    is_abstract: true,
    params: &[],
};

pub static IDENTIFIABLE: ClassDef = ClassDef {
    name: "Identifiable",
    base: Some(&REFERABLE),
    is_abstract: true,
    params: &[],
};

pub static SUBMODEL_ELEMENT: ClassDef = ClassDef {
    name: "SubmodelElement",
    base: Some(&REFERABLE),
    is_abstract: true,
    params: &[],
};

pub static DATA_ELEMENT: ClassDef = ClassDef {
    name: "DataElement",
    base: Some(&SUBMODEL_ELEMENT),
    is_abstract: true,
    params: &[],
};

pub static IDENTIFIER: ClassDef = ClassDef {
    name: "Identifier",
    base: None,
    is_abstract: false,
    params: &[ParamDef::required("id_"), ParamDef::required("id_type")],
};

pub static KEY: ClassDef = ClassDef {
    name: "Key",
    base: None,
    is_abstract: false,
    params: &[
        ParamDef::required("type_"),
        ParamDef::required("local"),
        ParamDef::required("value"),
        ParamDef::required("id_type"),
    ],
};

pub static REFERENCE: ClassDef = ClassDef {
    name: "Reference",
    base: None,
    is_abstract: false,
    params: &[ParamDef::required("key")],
};

pub static ADMINISTRATIVE_INFORMATION: ClassDef = ClassDef {
    name: "AdministrativeInformation",
    base: None,
    is_abstract: false,
    params: &[ParamDef::optional("version"), ParamDef::optional("revision")],
};

pub static PROPERTY: ClassDef = ClassDef {
    name: "Property",
    base: Some(&DATA_ELEMENT),
    is_abstract: false,
    params: &[
        ParamDef::required("id_short"),
        ParamDef::required("value_type"),
        ParamDef::optional("value"),
        ParamDef::optional("value_id"),
        ParamDef::optional("category"),
        ParamDef::optional("description"),
        ParamDef::optional("parent"),
        ParamDef::optional("semantic_id"),
        ParamDef::defaulted("kind", Literal::Enum(&MODELING_KIND, "INSTANCE")),
    ],
};

pub static MULTI_LANGUAGE_PROPERTY: ClassDef = ClassDef {
    name: "MultiLanguageProperty",
    base: Some(&DATA_ELEMENT),
    is_abstract: false,
    params: &[
        ParamDef::required("id_short"),
        ParamDef::optional("value"),
        ParamDef::optional("value_id"),
        ParamDef::optional("category"),
        ParamDef::optional("description"),
        ParamDef::optional("parent"),
        ParamDef::optional("semantic_id"),
        ParamDef::defaulted("kind", Literal::Enum(&MODELING_KIND, "INSTANCE")),
    ],
};

pub static SUBMODEL_ELEMENT_COLLECTION: ClassDef = ClassDef {
    name: "SubmodelElementCollection",
    base: Some(&SUBMODEL_ELEMENT),
    is_abstract: false,
    params: &[
        ParamDef::required("id_short"),
        ParamDef::defaulted("value", Literal::EmptyList),
        ParamDef::defaulted("ordered", Literal::Bool(false)),
        ParamDef::optional("category"),
        ParamDef::optional("description"),
        ParamDef::optional("parent"),
        ParamDef::optional("semantic_id"),
        ParamDef::defaulted("kind", Literal::Enum(&MODELING_KIND, "INSTANCE")),
    ],
};

pub static SUBMODEL: ClassDef = ClassDef {
    name: "Submodel",
    base: Some(&IDENTIFIABLE),
    is_abstract: false,
    params: &[
        ParamDef::required("identification"),
        ParamDef::defaulted("submodel_element", Literal::EmptyList),
        ParamDef::optional("id_short"),
        ParamDef::optional("category"),
        ParamDef::optional("description"),
        ParamDef::optional("parent"),
        ParamDef::optional("administration"),
        ParamDef::optional("semantic_id"),
        ParamDef::defaulted("kind", Literal::Enum(&MODELING_KIND, "INSTANCE")),
    ],
};

pub static ASSET: ClassDef = ClassDef {
    name: "Asset",
    base: Some(&IDENTIFIABLE),
    is_abstract: false,
    params: &[
        ParamDef::required("kind"),
        ParamDef::required("identification"),
        ParamDef::optional("id_short"),
        ParamDef::optional("category"),
        ParamDef::optional("description"),
        ParamDef::optional("parent"),
        ParamDef::optional("administration"),
    ],
};

pub static VIEW: ClassDef = ClassDef {
    name: "View",
    base: Some(&REFERABLE),
    is_abstract: false,
    params: &[
        ParamDef::required("id_short"),
        ParamDef::defaulted("contained_element", Literal::EmptyList),
        ParamDef::optional("category"),
        ParamDef::optional("description"),
        ParamDef::optional("parent"),
    ],
};

pub static ASSET_ADMINISTRATION_SHELL: ClassDef = ClassDef {
    name: "AssetAdministrationShell",
    base: Some(&IDENTIFIABLE),
    is_abstract: false,
    params: &[
        ParamDef::required("asset"),
        ParamDef::required("identification"),
        ParamDef::optional("id_short"),
        ParamDef::optional("category"),
        ParamDef::optional("description"),
        ParamDef::optional("parent"),
        ParamDef::optional("administration"),
        ParamDef::defaulted("submodel", Literal::EmptyList),
        ParamDef::defaulted("view", Literal::EmptyList),
    ],
};

pub static CLASSES: &[&ClassDef] = &[
    &REFERABLE,
    &IDENTIFIABLE,
    &SUBMODEL_ELEMENT,
    &DATA_ELEMENT,
    &IDENTIFIER,
    &KEY,
    &REFERENCE,
    &ADMINISTRATIVE_INFORMATION,
    &PROPERTY,
    &MULTI_LANGUAGE_PROPERTY,
    &SUBMODEL_ELEMENT_COLLECTION,
    &SUBMODEL,
    &ASSET,
    &VIEW,
    &ASSET_ADMINISTRATION_SHELL,
];

pub static ENUMS: &[&EnumDef] = &[
    &MODELING_KIND,
    &IDENTIFIER_TYPE,
    &ASSET_KIND,
    &KEY_ELEMENTS,
    &KEY_TYPE,
];

pub fn class_by_name(name: &str) -> Option<&'static ClassDef> {
    CLASSES.iter().copied().find(|class| class.name == name)
}

pub fn enum_by_name(name: &str) -> Option<&'static EnumDef> {
    ENUMS.iter().copied().find(|def| def.name == name)
}

static AAS_PACKVIEW: [PackViewAttr; 2] = [
    PackViewAttr::new("submodel", "Add submodel reference").add_type(TypeRef::Class(&REFERENCE)),
    PackViewAttr::new("view", "Add view").add_type(TypeRef::Class(&VIEW)),
];

/// Editor metadata for the classes above.
///
/// Every referable class hides `parent`, and `parent` is always passed
/// explicitly as `None` when a referable is rebuilt. A decomposed object would
/// otherwise recurse back into its own container.
pub static CLASSES_INFO_TABLE: &[ClassInfo] = &[
    ClassInfo::new(Target::Any).hidden(&["namespace_element_sets", "parent", "security", "source"]),
    ClassInfo::new(Target::Type(TypeRef::Class(&REFERABLE)))
        .default_params_to_hide(&[("parent", Literal::None)]),
    ClassInfo::new(Target::Type(TypeRef::Class(&IDENTIFIER))).params_to_attrs(&[("id_", "id")]),
    ClassInfo::new(Target::Type(TypeRef::Class(&KEY))).params_to_attrs(&[("type_", "type")]),
    ClassInfo::new(Target::Type(TypeRef::Class(&ASSET_ADMINISTRATION_SHELL)))
        .hidden(&["view"])
        .iter_attrs(&["submodel", "view"])
        .changed_parent("view")
        .add_action("Add view", TypeRef::Class(&VIEW))
        .packview(&AAS_PACKVIEW),
    ClassInfo::new(Target::Type(TypeRef::Class(&SUBMODEL)))
        .hidden(&["submodel_element"])
        .iter_attrs(&["submodel_element"])
        .changed_parent("submodel_element")
        .add_action("Add submodel element", TypeRef::Class(&SUBMODEL_ELEMENT)),
    ClassInfo::new(Target::Type(TypeRef::Class(&SUBMODEL_ELEMENT_COLLECTION)))
        .hidden(&["value"])
        .iter_attrs(&["value"])
        .changed_parent("value")
        .add_action("Add collection submodel element", TypeRef::Class(&SUBMODEL_ELEMENT)),
];
