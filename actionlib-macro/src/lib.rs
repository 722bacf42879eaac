/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Procedural macros for actionlib payload types.
//!
//! Goals, feedback and results carry an application payload. The
//! [`action_payload`] attribute gives a payload type everything the protocol
//! engine needs from it:
//!
//! ```ignore
//! #[action_payload]
//! pub struct FibonacciGoal {
//!     pub order: u32,
//! }
//!
//! // Payloads that an external codec will frame on the wire
//! #[action_payload(wire)]
//! pub struct FibonacciResult {
//!     pub sequence: Vec<u64>,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Options parsed from `#[action_payload(...)]`.
#[derive(Default)]
struct PayloadConfig {
    /// Also derive serde traits.
    wire: bool,
    /// Also derive `Default`.
    default: bool,
}

impl PayloadConfig {
    fn parse(attr: &TokenStream) -> Self {
        let mut config = Self::default();
        let attr_string = attr.to_string();
        for part in attr_string.split(',') {
            match part.trim() {
                "wire" => config.wire = true,
                "default" => config.default = true,
                _ => {}
            }
        }
        config
    }
}

/// Declares a goal, feedback or result payload type.
///
/// Expands to:
/// - `#[derive(Clone, Debug)]` for whichever of the two is not already derived
/// - `Default` as well with `#[action_payload(default)]`
/// - `serde::Serialize` and `serde::Deserialize` with `#[action_payload(wire)]`
/// - a compile-time assertion that the type is `Send + Sync + 'static`, which the
///   transport requires of anything it delivers between tasks
///
/// The `wire` option needs `serde` in scope of the calling crate.
#[proc_macro_attribute]
pub fn action_payload(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = PayloadConfig::parse(&attr);
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if config.default && !has_derive(&input, "Default") {
            traits.push(quote!(Default));
        }
        if config.wire {
            if !has_derive(&input, "Serialize") {
                traits.push(quote!(serde::Serialize));
            }
            if !has_derive(&input, "Deserialize") {
                traits.push(quote!(serde::Deserialize));
            }
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    let assert_ident = quote::format_ident!("_AssertActionPayload_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
