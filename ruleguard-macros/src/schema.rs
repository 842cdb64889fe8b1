use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Token, Visibility,
    meta::ParseNestedMeta,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Contents of one `#[rules(...)]` attribute
#[derive(Default)]
struct RulesArgs {
    expr: Option<LitStr>,
    name: Option<LitStr>,
}

impl Parse for RulesArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = RulesArgs::default();

        while !input.is_empty() {
            if input.peek(LitStr) {
                let lit: LitStr = input.parse()?;
                args.set_expr(lit)?;
            } else {
                let key: Ident = input.parse()?;
                input.parse::<Token![=]>()?;
                let lit: LitStr = input.parse()?;

                match key.to_string().as_str() {
                    "expr" => args.set_expr(lit)?,
                    "name" => {
                        if args.name.is_some() {
                            return Err(Error::new(key.span(), "duplicate `name` in #[rules]"));
                        }
                        args.name = Some(lit);
                    }
                    other => {
                        return Err(Error::new(
                            key.span(),
                            format!(
                                "unknown #[rules] key `{}`\n\
                                 hint: expected a rule string, `expr = \"...\"` or `name = \"...\"`",
                                other
                            ),
                        ));
                    }
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

impl RulesArgs {
    fn set_expr(&mut self, lit: LitStr) -> syn::Result<()> {
        if self.expr.is_some() {
            return Err(Error::new(lit.span(), "duplicate rule expression in #[rules]"));
        }
        self.expr = Some(lit);
        Ok(())
    }

    fn merge(&mut self, other: RulesArgs) -> syn::Result<()> {
        if let Some(expr) = other.expr {
            self.set_expr(expr)?;
        }
        if let Some(name) = other.name {
            if self.name.is_some() {
                return Err(Error::new(name.span(), "duplicate `name` in #[rules]"));
            }
            self.name = Some(name);
        }
        Ok(())
    }
}

/// What `#[serde(...)]` says about a field
#[derive(Default)]
struct SerdeField {
    rename: Option<LitStr>,
    skip: bool,
}

fn serde_field(attrs: &[Attribute]) -> syn::Result<SerdeField> {
    let mut field = SerdeField::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    field.rename = Some(meta.value()?.parse()?);
                } else {
                    // rename(serialize = "...", deserialize = "...")
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("serialize") {
                            field.rename = Some(inner.value()?.parse()?);
                            Ok(())
                        } else {
                            skip_meta(&inner)
                        }
                    })?;
                }
                Ok(())
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                field.skip = true;
                Ok(())
            } else {
                skip_meta(&meta)
            }
        })?;
    }

    Ok(field)
}

/// Consume a serde option this macro does not care about
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}

fn rules_args(attrs: &[Attribute]) -> syn::Result<Option<RulesArgs>> {
    let mut found: Option<RulesArgs> = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("rules")) {
        let args: RulesArgs = attr.parse_args()?;
        match found.as_mut() {
            Some(existing) => existing.merge(args)?,
            None => found = Some(args),
        }
    }

    Ok(found)
}

pub fn derive_rules_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    Span::call_site(),
                    "#[derive(Rules)] requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new(
                Span::call_site(),
                "#[derive(Rules)] can only be used on structs",
            ));
        }
    };

    let mut entries = Vec::new();

    for field in fields {
        let Some(args) = rules_args(&field.attrs)? else {
            continue;
        };
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        if !matches!(field.vis, Visibility::Public(_)) {
            return Err(Error::new_spanned(
                ident,
                format!(
                    "#[rules] on non-public field `{}`\n\
                     hint: only `pub` fields take part in the rule schema",
                    ident
                ),
            ));
        }

        let serde = serde_field(&field.attrs)?;
        if serde.skip {
            continue;
        }

        let Some(expr) = args.expr else {
            continue;
        };

        let serialized = args
            .name
            .or(serde.rename)
            .unwrap_or_else(|| LitStr::new(&unraw(ident), ident.span()));

        entries.push(quote! {
            ::ruleguard::__private::FieldRules::new(#serialized, #expr)
        });
    }

    Ok(quote! {
        impl #impl_generics ::ruleguard::__private::Schema for #name #ty_generics #where_clause {
            fn field_rules(&self) -> ::std::vec::Vec<::ruleguard::__private::FieldRules> {
                ::std::vec![
                    #(#entries),*
                ]
            }
        }
    })
}

/// Field name as serde would serialize it (`r#type` becomes `type`)
fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}
