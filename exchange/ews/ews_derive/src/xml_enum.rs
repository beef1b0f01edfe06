/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DataEnum, Ident, LitStr};

const MACRO_ATTRIBUTE: &str = "xml_enum";

pub(super) fn write_xml_enum_derivation(ident: Ident, data: DataEnum) -> syn::Result<TokenStream> {
    let variants = data
        .variants
        .into_iter()
        .map(|variant| {
            if !matches!(variant.fields, syn::Fields::Unit) {
                return Err(syn::Error::new_spanned(
                    &variant,
                    "`XmlEnum` variants may not carry fields",
                ));
            }

            let options = VariantOptions::try_from(variant.attrs.as_slice())?;
            let text = options
                .rename
                .unwrap_or_else(|| variant.ident.to_string());

            Ok(Variant {
                ident: variant.ident,
                text,
                is_fallback: options.is_fallback,
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let mut fallbacks = variants.iter().filter(|variant| variant.is_fallback);
    let fallback = fallbacks.next();
    if let Some(extra) = fallbacks.next() {
        return Err(syn::Error::new_spanned(
            &extra.ident,
            "at most one variant may be marked `fallback`",
        ));
    }

    let texts: Vec<_> = variants.iter().map(|variant| &variant.text).collect();
    let idents: Vec<_> = variants.iter().map(|variant| &variant.ident).collect();

    let unrecognized = match fallback {
        Some(variant) => {
            let ident = &variant.ident;
            quote!(Some(Self::#ident))
        }
        None => quote!(None),
    };

    Ok(quote!(
        #[automatically_derived]
        impl ::ews::xml::XmlEnum for #ident {
            const VARIANTS: &'static [&'static str] = &[#(#texts),*];

            fn as_xml_str(&self) -> &'static str {
                match self {
                    #(Self::#idents => #texts,)*
                }
            }

            fn from_xml_str(value: &str) -> Option<Self> {
                match value {
                    #(#texts => Some(Self::#idents),)*
                    _ => #unrecognized,
                }
            }
        }
    ))
}

struct Variant {
    ident: Ident,
    text: String,
    is_fallback: bool,
}

#[derive(Default)]
struct VariantOptions {
    rename: Option<String>,
    is_fallback: bool,
}

impl TryFrom<&[Attribute]> for VariantOptions {
    type Error = syn::Error;

    fn try_from(attrs: &[Attribute]) -> Result<Self, Self::Error> {
        let mut options = VariantOptions::default();

        for attr in attrs
            .iter()
            .filter(|attr| attr.path().is_ident(MACRO_ATTRIBUTE))
        {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    options.rename = Some(value.value());

                    Ok(())
                } else if meta.path.is_ident("fallback") {
                    options.is_fallback = true;

                    Ok(())
                } else {
                    Err(meta.error("unrecognized `xml_enum` attribute"))
                }
            })?;
        }

        Ok(options)
    }
}
