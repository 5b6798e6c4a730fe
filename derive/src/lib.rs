//! Derive macros for bindery.
//!
//! This crate provides the `#[derive(ViewModel)]` macro that generates the
//! static reflection table the property-path engine resolves paths against,
//! plus typed getters and change-notifying setters for every property.
//!
//! # Example
//!
//! ```rust,ignore
//! use bindery::{Prop, PropertyChanged, ViewModel};
//! use std::rc::Rc;
//!
//! #[derive(ViewModel, Default)]
//! #[view_model(rename_all = "PascalCase")]
//! struct Person {
//!     #[notify]
//!     changed: PropertyChanged,
//!     #[property]
//!     first_name: Prop<String>,
//!     #[property(name = "Home")]
//!     address: Prop<Option<Rc<Address>>>,
//! }
//!
//! let person = Person::default();
//! person.set_first_name("Ada".into()); // raises "FirstName"
//! assert_eq!(person.first_name(), "Ada");
//! ```
//!
//! Field attributes:
//!
//! - `#[property]` / `#[property(name = "...", readonly)]` on `Prop<T>` fields.
//! - `#[notify]` on the `PropertyChanged` field (change-notification capability).
//! - `#[events]` on the `UiEvents` field (UI-event capability).
//! - `#[base]` on an embedded view-model the struct derives from. Properties
//!   of the base stay visible through the derived type, and the base's
//!   notifier and events are used when the struct declares none itself.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, PathArguments,
    Type,
};

/// How generated property names are derived from field names.
#[derive(Clone, Copy)]
enum RenameRule {
    /// Use the field name as written.
    None,
    PascalCase,
    CamelCase,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "PascalCase" => Ok(RenameRule::PascalCase),
            "camelCase" => Ok(RenameRule::CamelCase),
            "none" => Ok(RenameRule::None),
            _ => Err(syn::Error::new(
                lit.span(),
                "expected \"PascalCase\", \"camelCase\" or \"none\"",
            )),
        }
    }

    fn apply(self, field: &str) -> String {
        match self {
            RenameRule::None => field.to_string(),
            RenameRule::PascalCase => to_pascal_case(field),
            RenameRule::CamelCase => {
                let pascal = to_pascal_case(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
        }
    }
}

/// Struct-level `#[view_model(...)]` options.
struct ModelAttr {
    name: Option<String>,
    rename_all: RenameRule,
}

fn parse_model_attr(input: &DeriveInput) -> syn::Result<ModelAttr> {
    let mut attr = ModelAttr {
        name: None,
        rename_all: RenameRule::None,
    };
    for a in input.attrs.iter().filter(|a| a.path().is_ident("view_model")) {
        a.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                attr.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("rename_all") {
                let lit: LitStr = meta.value()?.parse()?;
                attr.rename_all = RenameRule::parse(&lit)?;
                Ok(())
            } else {
                Err(meta.error("unsupported view_model option"))
            }
        })?;
    }
    Ok(attr)
}

/// Parsed `#[property]` / `#[property(name = "...", readonly)]`.
struct PropertyAttr {
    name: Option<String>,
    readonly: bool,
}

fn parse_property_attr(attr: &syn::Attribute) -> syn::Result<Option<PropertyAttr>> {
    if !attr.path().is_ident("property") {
        return Ok(None);
    }
    let mut parsed = PropertyAttr {
        name: None,
        readonly: false,
    };
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(Some(parsed));
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            let lit: LitStr = meta.value()?.parse()?;
            parsed.name = Some(lit.value());
            Ok(())
        } else if meta.path.is_ident("readonly") {
            parsed.readonly = true;
            Ok(())
        } else {
            Err(meta.error("unsupported property option"))
        }
    })?;
    Ok(Some(parsed))
}

/// Extract `T` from `Prop<T>`.
fn extract_prop_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Prop" {
            if let PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(GenericArgument::Type(inner_ty)) = args.args.first() {
                    return Some(inner_ty);
                }
            }
        }
    }
    None
}

struct PropertyField {
    ident: Ident,
    vis: syn::Visibility,
    value_ty: Type,
    name: String,
    readonly: bool,
}

/// Derive macro that implements `Object` and `ViewModel` for a struct.
///
/// For a struct `Person` with a `#[property] name: Prop<String>` field this
/// generates:
/// - `impl Object for Person` (runtime type info, upcasting, capabilities)
/// - `impl ViewModel for Person` with a lazily built static `TypeInfo`
/// - `fn name(&self) -> String` and `fn set_name(&self, String)`; the setter
///   raises `"name"` on the struct's notifier when the value changed
#[proc_macro_derive(ViewModel, attributes(view_model, property, notify, events, base))]
pub fn derive_view_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ViewModel cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "ViewModel can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "ViewModel can only be derived for structs",
            ));
        }
    };

    let model_attr = parse_model_attr(input)?;
    let type_name = model_attr
        .name
        .clone()
        .unwrap_or_else(|| struct_name.to_string());

    let mut notify_field: Option<Ident> = None;
    let mut events_field: Option<Ident> = None;
    let mut base_field: Option<(Ident, Type)> = None;
    let mut properties = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        for attr in &field.attrs {
            if attr.path().is_ident("notify") {
                if notify_field.replace(ident.clone()).is_some() {
                    return Err(syn::Error::new_spanned(attr, "duplicate #[notify] field"));
                }
            } else if attr.path().is_ident("events") {
                if events_field.replace(ident.clone()).is_some() {
                    return Err(syn::Error::new_spanned(attr, "duplicate #[events] field"));
                }
            } else if attr.path().is_ident("base") {
                if base_field
                    .replace((ident.clone(), field.ty.clone()))
                    .is_some()
                {
                    return Err(syn::Error::new_spanned(attr, "only one #[base] field is allowed"));
                }
            } else if let Some(prop) = parse_property_attr(attr)? {
                let Some(value_ty) = extract_prop_inner_type(&field.ty) else {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "#[property] fields must have type Prop<T>",
                    ));
                };
                let name = prop
                    .name
                    .unwrap_or_else(|| model_attr.rename_all.apply(&ident.to_string()));
                properties.push(PropertyField {
                    ident: ident.clone(),
                    vis: field.vis.clone(),
                    value_ty: value_ty.clone(),
                    name,
                    readonly: prop.readonly,
                });
            }
        }
    }

    let upcast_fallback = match &base_field {
        Some((base, _)) => quote! { ::bindery::Object::upcast(&self.#base, target) },
        None => quote! { ::std::option::Option::None },
    };
    let notifier_body = match (&notify_field, &base_field) {
        (Some(field), _) => quote! { ::std::option::Option::Some(&self.#field) },
        (None, Some((base, _))) => quote! { ::bindery::Object::notifier(&self.#base) },
        (None, None) => quote! { ::std::option::Option::None },
    };
    let events_body = match (&events_field, &base_field) {
        (Some(field), _) => quote! { ::std::option::Option::Some(&self.#field) },
        (None, Some((base, _))) => quote! { ::bindery::Object::ui_events(&self.#base) },
        (None, None) => quote! { ::std::option::Option::None },
    };
    let base_registration = match &base_field {
        Some((_, base_ty)) => quote! {
            .base(<#base_ty as ::bindery::ViewModel>::static_type_info())
        },
        None => quote! {},
    };

    let mut reflection_fns = Vec::new();
    let mut descriptors = Vec::new();
    let mut accessors = Vec::new();

    for prop in &properties {
        let PropertyField {
            ident,
            vis,
            value_ty,
            name,
            readonly,
        } = prop;
        let getter_fn = format_ident!("__bindery_get_{}", ident);
        let setter_fn = format_ident!("__bindery_set_{}", ident);
        let typed_setter = format_ident!("set_{}", ident);
        let getter_doc = format!("Current value of the `{}` property.", name);
        let setter_doc = format!(
            "Set the `{}` property, raising a change notification when the value changed.",
            name
        );

        reflection_fns.push(quote! {
            #[doc(hidden)]
            fn #getter_fn(
                object: &dyn ::bindery::Object,
            ) -> ::std::option::Option<::bindery::Value> {
                ::bindery::downcast_object::<#struct_name>(object).map(|this| {
                    this.#ident
                        .with(|value| <#value_ty as ::bindery::PropertyValue>::to_value(value))
                })
            }

            #[doc(hidden)]
            #[allow(dead_code)]
            fn #setter_fn(object: &dyn ::bindery::Object, value: ::bindery::Value) -> bool {
                let ::std::option::Option::Some(this) =
                    ::bindery::downcast_object::<#struct_name>(object)
                else {
                    return false;
                };
                match <#value_ty as ::bindery::PropertyValue>::from_value(value) {
                    ::std::option::Option::Some(value) => {
                        this.#typed_setter(value);
                        true
                    }
                    ::std::option::Option::None => false,
                }
            }
        });

        let setter = if *readonly {
            quote! { ::std::option::Option::None }
        } else {
            quote! {
                ::std::option::Option::Some(#struct_name::#setter_fn as ::bindery::PropertySetter)
            }
        };
        descriptors.push(quote! {
            .property(::bindery::PropertyDescriptor::new(
                #name,
                <#value_ty as ::bindery::PropertyValue>::value_type,
                #struct_name::#getter_fn,
                #setter,
            ))
        });

        accessors.push(quote! {
            #[doc = #getter_doc]
            #[allow(dead_code)]
            #vis fn #ident(&self) -> #value_ty {
                self.#ident.get()
            }

            #[doc = #setter_doc]
            #[allow(dead_code)]
            #vis fn #typed_setter(&self, value: #value_ty) {
                if self
                    .#ident
                    .set_if(value, <#value_ty as ::bindery::PropertyValue>::same)
                {
                    if let ::std::option::Option::Some(notifier) = ::bindery::Object::notifier(self) {
                        notifier.raise(#name);
                    }
                }
            }
        });
    }

    Ok(quote! {
        impl ::bindery::Object for #struct_name {
            fn type_info(&self) -> &'static ::bindery::TypeInfo {
                <#struct_name as ::bindery::ViewModel>::static_type_info()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::rc::Rc<Self>,
            ) -> ::std::rc::Rc<dyn ::std::any::Any> {
                self
            }

            fn upcast(
                &self,
                target: ::std::any::TypeId,
            ) -> ::std::option::Option<&dyn ::std::any::Any> {
                if target == ::std::any::TypeId::of::<#struct_name>() {
                    return ::std::option::Option::Some(self as &dyn ::std::any::Any);
                }
                #upcast_fallback
            }

            fn notifier(&self) -> ::std::option::Option<&::bindery::PropertyChanged> {
                #notifier_body
            }

            fn ui_events(&self) -> ::std::option::Option<&::bindery::UiEvents> {
                #events_body
            }
        }

        impl ::bindery::ViewModel for #struct_name {
            fn static_type_info() -> &'static ::bindery::TypeInfo {
                static INFO: ::std::sync::OnceLock<::bindery::TypeInfo> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init(|| {
                    ::bindery::TypeInfo::builder::<#struct_name>(#type_name)
                        #base_registration
                        #(#descriptors)*
                        .build()
                })
            }
        }

        impl #struct_name {
            #(#reflection_fns)*
            #(#accessors)*
        }
    })
}

/// Convert a snake_case field name to PascalCase.
fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
