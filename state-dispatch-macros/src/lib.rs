//! Procedural macros for state-dispatch
//!
//! `#[derive(Action)]` names every variant of an action enum and, with
//! `#[action(infer_categories)]`, groups variants by the subject at the
//! front of their names.

use std::collections::BTreeMap;

use darling::{ast, FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::{Ident, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput};

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionInput {
    ident: Ident,
    data: ast::Data<VariantInput, ()>,

    /// Derive categories from variant names
    #[darling(default)]
    infer_categories: bool,
}

#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct VariantInput {
    ident: Ident,

    /// Use this category instead of the inferred one
    #[darling(default)]
    category: Option<String>,

    /// Leave the variant uncategorized
    #[darling(default)]
    skip_category: bool,
}

/// Words that end the subject of an action name. Only verbs belong here; a
/// noun such as "Products" would cut `CategoryProductsFetch` short.
const VERBS: &[&str] = &[
    "Fetch", "Load", "Refresh", "Reload", "Submit", "Retry", "Login", "Logout", "Register",
    "Verify", "Restore", "Add", "Remove", "Clear", "Update", "Set", "Get", "Save", "Delete",
    "Create", "Show", "Hide", "Enable", "Disable", "Toggle", "Select", "Open", "Close", "Reset",
];

/// Separates the subject from an outcome, as in `CategoriesDidLoad`
const RESULT_MARKER: &str = "Did";

/// Category given to variants that start with [`RESULT_MARKER`]
const ASYNC_RESULT: &str = "async_result";

fn is_verb(word: &str) -> bool {
    VERBS.contains(&word)
}

/// `CategoryProductsDidLoad` -> `["Category", "Products", "Did", "Load"]`
fn words(name: &str) -> Vec<&str> {
    let mut bounds: Vec<usize> = name
        .char_indices()
        .filter(|(i, c)| *i > 0 && c.is_uppercase())
        .map(|(i, _)| i)
        .collect();
    bounds.insert(0, 0);
    bounds.push(name.len());
    bounds
        .windows(2)
        .map(|w| &name[w[0]..w[1]])
        .filter(|w| !w.is_empty())
        .collect()
}

fn snake_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect()
}

/// Category of a variant name, if its naming follows the conventions
///
/// - `CategoryProductsFetch`, `CategoryProductsDidLoad` -> `category_products`
/// - `SessionLoginDidFail` -> `session`
/// - `DidSomething` -> `async_result`
/// - `Quit`, `ToggleFavorite` -> none
fn infer_category(name: &str) -> Option<String> {
    let words = words(name);
    let (first, rest) = words.split_first()?;
    if *first == RESULT_MARKER {
        return Some(ASYNC_RESULT.to_string());
    }
    if is_verb(first) {
        return None;
    }
    let subject_len = 1 + rest
        .iter()
        .position(|w| *w == RESULT_MARKER || is_verb(w))?;
    Some(snake_case(&words[..subject_len]))
}

fn category_of(variant: &VariantInput) -> Option<String> {
    if variant.skip_category {
        return None;
    }
    variant
        .category
        .clone()
        .or_else(|| infer_category(&variant.ident.to_string()))
}

/// Derive the `Action` trait
///
/// Generates `name()`, returning the variant name.
///
/// With `#[action(infer_categories)]` it also generates:
/// - a `{Name}Category` enum with one variant per category plus `Uncategorized`
/// - inherent `category()` and `category_enum()` methods
/// - an `is_{category}()` predicate per category
/// - an `ActionCategory` impl
///
/// On a variant, `#[action(category = "...")]` overrides inference and
/// `#[action(skip_category)]` opts out of it.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// #[action(infer_categories)]
/// enum Action {
///     FavoritesLoad,
///     FavoritesDidLoad(Vec<Product>),
///     #[action(category = "catalog")]
///     CategoriesFetch,
/// }
///
/// assert_eq!(Action::FavoritesLoad.name(), "FavoritesLoad");
/// assert_eq!(Action::FavoritesLoad.category(), Some("favorites"));
/// assert!(Action::CategoriesFetch.is_catalog());
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match ActionInput::from_derive_input(&input) {
        Ok(parsed) => expand(&parsed).into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(input: &ActionInput) -> TokenStream2 {
    let ty = &input.ident;
    let ast::Data::Enum(variants) = &input.data else {
        return syn::Error::new_spanned(ty, "Action can only be derived for enums")
            .to_compile_error();
    };

    let name_arms = variants.iter().map(|v| {
        let ident = &v.ident;
        let name = ident.to_string();
        quote! { Self::#ident { .. } => #name }
    });

    let mut tokens = quote! {
        impl state_dispatch::Action for #ty {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms,)*
                }
            }
        }
    };

    if input.infer_categories {
        tokens.extend(expand_categories(ty, variants));
    }
    tokens
}

fn expand_categories(ty: &Ident, variants: &[VariantInput]) -> TokenStream2 {
    let assigned: Vec<(&Ident, Option<String>)> =
        variants.iter().map(|v| (&v.ident, category_of(v))).collect();

    // Sorted so the generated enum does not depend on declaration order
    let mut members: BTreeMap<&str, Vec<&Ident>> = BTreeMap::new();
    for (ident, category) in &assigned {
        if let Some(category) = category {
            members.entry(category.as_str()).or_default().push(*ident);
        }
    }

    let enum_ty = format_ident!("{}Category", ty);
    let names: Vec<&str> = members.keys().copied().collect();
    let tags: Vec<Ident> = names
        .iter()
        .map(|name| format_ident!("{}", pascal_case(name)))
        .collect();

    let str_arms = assigned.iter().map(|(ident, category)| match category {
        Some(name) => quote! { Self::#ident { .. } => ::core::option::Option::Some(#name) },
        None => quote! { Self::#ident { .. } => ::core::option::Option::None },
    });

    let enum_arms = assigned.iter().map(|(ident, category)| {
        let tag = match category {
            Some(name) => format_ident!("{}", pascal_case(name)),
            None => format_ident!("Uncategorized"),
        };
        quote! { Self::#ident { .. } => #enum_ty::#tag }
    });

    let predicates = members.iter().map(|(name, idents)| {
        let predicate = format_ident!("is_{}", name);
        let doc = format!("True if this action is in the `{name}` category.");
        quote! {
            #[doc = #doc]
            pub fn #predicate(&self) -> bool {
                matches!(self, #(Self::#idents { .. })|*)
            }
        }
    });

    let enum_doc = format!("Categories of [`{ty}`]; see [`{ty}::category_enum`].");

    quote! {
        #[doc = #enum_doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum #enum_ty {
            #(#tags,)*
            /// Actions without a category
            Uncategorized,
        }

        impl #enum_ty {
            /// Every category, `Uncategorized` last
            pub fn all() -> &'static [Self] {
                &[#(Self::#tags,)* Self::Uncategorized]
            }

            pub fn name(&self) -> &'static str {
                match self {
                    #(Self::#tags => #names,)*
                    Self::Uncategorized => "uncategorized",
                }
            }
        }

        impl #ty {
            /// Category name, `None` when uncategorized
            pub fn category(&self) -> ::core::option::Option<&'static str> {
                match self {
                    #(#str_arms,)*
                }
            }

            pub fn category_enum(&self) -> #enum_ty {
                match self {
                    #(#enum_arms,)*
                }
            }

            #(#predicates)*
        }

        impl state_dispatch::ActionCategory for #ty {
            type Category = #enum_ty;

            fn category(&self) -> ::core::option::Option<&'static str> {
                #ty::category(self)
            }

            fn category_enum(&self) -> Self::Category {
                #ty::category_enum(self)
            }
        }
    }
}
