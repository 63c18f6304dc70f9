use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, parse_macro_input};

/// Test attribute that installs per-test tracing before the body runs.
///
/// On an async fn this expands to `#[tokio::test]` with the body wrapped in
/// `solo::trace::with_test_tracing`; on a sync fn it expands to a plain
/// `#[test]` with the sync equivalent. Extra arguments are forwarded to
/// `tokio::test`:
///
/// #[solo::test(flavor = "multi_thread")]
/// async fn my_test() { ... }
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = proc_macro2::TokenStream::from(attr);
    let func = parse_macro_input!(item as ItemFn);
    let vis = &func.vis;
    let sig = &func.sig;
    let body = &func.block;
    let name = &sig.ident;

    let tokio_args = if attr_args.is_empty() {
        quote! {}
    } else {
        quote! { ( #attr_args ) }
    };

    let expanded = if sig.asyncness.is_some() {
        quote! {
            #[tokio::test #tokio_args]
            #vis #sig {
                solo::trace::with_test_tracing(stringify!(#name), || async move { #body }).await
            }
        }
    } else {
        quote! {
            #[test]
            #vis #sig {
                solo::trace::with_test_tracing_sync(stringify!(#name), || #body)
            }
        }
    };
    expanded.into()
}
