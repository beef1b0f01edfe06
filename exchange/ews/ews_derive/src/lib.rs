/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod xml_enum;
use xml_enum::write_xml_enum_derivation;

/// Derives `ews::xml::XmlEnum` for a unit enum, mapping each variant to the
/// text EWS uses for it on the wire.
///
/// Variants are written using their identifier unless renamed with
/// `#[xml_enum(rename = "...")]`. At most one variant may be marked
/// `#[xml_enum(fallback)]`; unrecognized text parses as that variant instead
/// of failing.
#[proc_macro_derive(XmlEnum, attributes(xml_enum))]
pub fn derive_xml_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match input.data {
        syn::Data::Enum(enum_input) => write_xml_enum_derivation(input.ident, enum_input)
            .unwrap_or_else(syn::Error::into_compile_error)
            .into(),

        _ => syn::Error::new_spanned(input.ident, "`XmlEnum` derivation is only supported for unit enums")
            .into_compile_error()
            .into(),
    }
}
