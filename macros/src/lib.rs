use proc_macro::TokenStream;
use quote::quote;
use syn::{Ident, ItemFn, LitStr, parse_macro_input, spanned::Spanned};

/// Test attribute shared by native and wasm32 targets.
///
/// - `#[rxtoggle_macro::test]` expands to `#[test]` natively and to
///   `#[wasm_bindgen_test]` on wasm32.
/// - `#[rxtoggle_macro::test(marble)]` additionally resets the crate's
///   virtual-time `TestScheduler` before the body runs. Only usable from unit
///   tests inside the `rxtoggle` crate, where `crate::test_scheduler` exists.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);

  if let Some(asyncness) = input.sig.asyncness {
    return TokenStream::from(
      syn::Error::new(
        asyncness.span(),
        "rxtoggle_macro::test does not drive futures; write a synchronous test",
      )
      .to_compile_error(),
    );
  }

  let raw_args = proc_macro2::TokenStream::from(attr);
  let marble = if raw_args.is_empty() {
    false
  } else {
    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      ident.to_string()
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      lit.value()
    } else {
      String::new()
    };
    if flavor != "marble" {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxtoggle_macro::test only accepts: #[rxtoggle_macro::test] or \
           #[rxtoggle_macro::test(marble)]",
        )
        .to_compile_error(),
      );
    }
    true
  };

  if marble {
    let init: syn::Stmt = syn::parse_quote!(crate::test_scheduler::TestScheduler::init(););
    input.block.stmts.insert(0, init);
  }

  let expanded = quote! {
      #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
      #[cfg_attr(not(target_arch = "wasm32"), test)]
      #input
  };

  TokenStream::from(expanded)
}
