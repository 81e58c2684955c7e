use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg, GenericArgument, ItemTrait, LitStr, PathArguments, ReturnType, TraitItem, TraitItemFn,
    Type, parse_macro_input,
};

/// Sequence collections whose single parameter makes a write a batch.
const COLLECTION_TYPES: [&str; 6] = [
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "BinaryHeap",
];

/// Structural shape of a declared type, mirrored from `mango::TypeShape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Plain,
    Collection,
    Array,
}

/// Determine the shape of a type syntactically.
///
/// References and parentheses are looked through.
fn type_shape(ty: &Type) -> Shape {
    match ty {
        Type::Reference(r) => type_shape(&r.elem),
        Type::Paren(p) => type_shape(&p.elem),
        Type::Group(g) => type_shape(&g.elem),
        Type::Array(_) | Type::Slice(_) => Shape::Array,
        Type::Path(p) => match p.path.segments.last() {
            Some(last) if COLLECTION_TYPES.contains(&last.ident.to_string().as_str()) => {
                Shape::Collection
            }
            _ => Shape::Plain,
        },
        _ => Shape::Plain,
    }
}

/// Render a type the way it is written, without token spacing.
fn type_name(ty: &Type) -> String {
    let raw = quote!(#ty).to_string();
    raw.replace(" < ", "<")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace(" ;", ";")
        .replace(":: ", "::")
        .replace(" ::", "::")
        .replace("& ", "&")
}

/// Render a type with its generic arguments erased: `Vec<User>` becomes `Vec`.
fn erased_type_name(ty: &Type) -> String {
    match ty {
        Type::Path(p) if p.qself.is_none() => p
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect::<Vec<_>>()
            .join("::"),
        Type::Reference(r) => format!("&{}", erased_type_name(&r.elem)),
        _ => type_name(ty),
    }
}

/// Look through `Result<T, E>` to `T`.
fn unwrap_result(ty: &Type) -> &Type {
    let Type::Path(p) = ty else {
        return ty;
    };
    let Some(last) = p.path.segments.last() else {
        return ty;
    };
    if last.ident != "Result" {
        return ty;
    }
    match &last.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(inner)) => inner,
            _ => ty,
        },
        _ => ty,
    }
}

fn shape_tokens(shape: Shape) -> proc_macro2::TokenStream {
    match shape {
        Shape::Plain => quote! { ::mango::TypeShape::Plain },
        Shape::Collection => quote! { ::mango::TypeShape::Collection },
        Shape::Array => quote! { ::mango::TypeShape::Array },
    }
}

fn type_descriptor_tokens(name: &str, shape: Shape) -> proc_macro2::TokenStream {
    let shape = shape_tokens(shape);
    quote! { ::mango::TypeDescriptor::new(#name, #shape) }
}

/// Facts about one trait method, collected before its attributes are stripped.
struct MethodFacts {
    name: String,
    sql: Option<String>,
    return_generated_id: bool,
    return_type: (String, Shape),
    generic_return_type: (String, Shape),
    parameter_types: Vec<(String, Shape)>,
}

/// Collect the facts of a method and strip `#[sql]` / `#[return_generated_id]`.
fn take_method_facts(method: &mut TraitItemFn) -> syn::Result<MethodFacts> {
    let mut sql = None;
    let mut return_generated_id = false;

    for attr in &method.attrs {
        if attr.path().is_ident("sql") {
            let lit: LitStr = attr.parse_args()?;
            sql = Some(lit.value());
        } else if attr.path().is_ident("return_generated_id") {
            attr.meta.require_path_only()?;
            return_generated_id = true;
        }
    }
    method
        .attrs
        .retain(|a| !a.path().is_ident("sql") && !a.path().is_ident("return_generated_id"));

    let (return_type, generic_return_type) = match &method.sig.output {
        ReturnType::Default => (
            ("()".to_string(), Shape::Plain),
            ("()".to_string(), Shape::Plain),
        ),
        ReturnType::Type(_, ty) => {
            let ty = unwrap_result(ty);
            let shape = type_shape(ty);
            ((erased_type_name(ty), shape), (type_name(ty), shape))
        }
    };

    let parameter_types = method
        .sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Receiver(_) => None,
            FnArg::Typed(pat) => Some((type_name(&pat.ty), type_shape(&pat.ty))),
        })
        .collect();

    Ok(MethodFacts {
        name: method.sig.ident.to_string(),
        sql,
        return_generated_id,
        return_type,
        generic_return_type,
        parameter_types,
    })
}

fn descriptor_tokens(facts: &MethodFacts) -> proc_macro2::TokenStream {
    let name = &facts.name;
    let sql = match &facts.sql {
        Some(sql) => quote! { ::std::option::Option::Some(::std::string::String::from(#sql)) },
        None => quote! { ::std::option::Option::None },
    };
    let return_generated_id = facts.return_generated_id;
    let return_type = type_descriptor_tokens(&facts.return_type.0, facts.return_type.1);
    let generic_return_type =
        type_descriptor_tokens(&facts.generic_return_type.0, facts.generic_return_type.1);
    let parameter_types = facts
        .parameter_types
        .iter()
        .map(|(name, shape)| type_descriptor_tokens(name, *shape));

    quote! {
        ::mango::MethodDescriptor {
            name: ::std::string::String::from(#name),
            sql: #sql,
            return_generated_id: #return_generated_id,
            return_type: #return_type,
            generic_return_type: #generic_return_type,
            parameter_types: ::std::vec![#(#parameter_types),*],
        }
    }
}

fn expand(mut item: ItemTrait) -> syn::Result<proc_macro2::TokenStream> {
    let mut descriptors = Vec::new();
    for trait_item in item.items.iter_mut() {
        if let TraitItem::Fn(method) = trait_item {
            let facts = take_method_facts(method)?;
            descriptors.push(descriptor_tokens(&facts));
        }
    }

    let vis = &item.vis;
    let trait_name = item.ident.to_string();
    let mapper_name = format_ident!("{}Mapper", item.ident);
    let doc = format!("Method descriptors of the [`{}`] mapper interface.", trait_name);

    Ok(quote! {
        #item

        #[doc = #doc]
        #vis struct #mapper_name;

        impl ::mango::MapperInterface for #mapper_name {
            const NAME: &'static str = #trait_name;

            fn descriptors() -> ::std::vec::Vec<::mango::MethodDescriptor> {
                ::std::vec![#(#descriptors),*]
            }
        }
    })
}

/// Attribute macro for mapper interfaces.
///
/// Applied to a trait, reads these method attributes:
/// - `#[sql("...")]` - the raw SQL statement
/// - `#[return_generated_id]` - return the database-generated id of an insert
///
/// Both attributes are stripped from the emitted trait. Alongside the trait it
/// generates a unit struct `<Trait>Mapper` implementing `mango::MapperInterface`,
/// whose `descriptors()` returns one `MethodDescriptor` per trait method.
///
/// ## Type shapes
///
/// - `Vec`, `VecDeque`, `LinkedList`, `HashSet`, `BTreeSet`, `BinaryHeap` - collection
/// - `[T; N]`, `[T]`, `&[T]` - array
/// - everything else - plain
///
/// A `Result<T, E>` return type is described as `T`.
///
/// ## Example
///
/// ```text
/// #[mango::mapper]
/// pub trait UserDao {
///     #[sql("insert into users(name) values($1)")]
///     #[return_generated_id]
///     fn insert(&self, name: String) -> Result<i64, MangoError>;
///
///     #[sql("select id, name from users")]
///     fn find_all(&self) -> Result<Vec<User>, MangoError>;
/// }
///
/// let mapper = Mapper::for_interface::<UserDaoMapper>()?;
/// ```
#[proc_macro_attribute]
pub fn mapper(_args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemTrait);
    match expand(item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn collections_and_arrays_have_sequence_shapes() {
        let cases: Vec<(Type, Shape)> = vec![
            (parse_quote!(Vec<User>), Shape::Collection),
            (parse_quote!(std::collections::HashSet<i64>), Shape::Collection),
            (parse_quote!(&Vec<User>), Shape::Collection),
            (parse_quote!([User; 4]), Shape::Array),
            (parse_quote!(&[User]), Shape::Array),
            (parse_quote!(HashMap<String, i64>), Shape::Plain),
            (parse_quote!(Option<Vec<User>>), Shape::Plain),
            (parse_quote!(String), Shape::Plain),
        ];

        for (ty, expected) in cases {
            assert_eq!(type_shape(&ty), expected, "{}", type_name(&ty));
        }
    }

    #[test]
    fn names_render_without_token_spacing() {
        let ty: Type = parse_quote!(std::vec::Vec<Option<User>>);
        assert_eq!(type_name(&ty), "std::vec::Vec<Option<User>>");
        assert_eq!(erased_type_name(&ty), "std::vec::Vec");

        let slice: Type = parse_quote!(&[i64]);
        assert_eq!(type_name(&slice), "&[i64]");
    }

    #[test]
    fn result_return_types_are_looked_through() {
        let ty: Type = parse_quote!(Result<Vec<User>, MangoError>);
        assert_eq!(type_name(unwrap_result(&ty)), "Vec<User>");

        let plain: Type = parse_quote!(u64);
        assert_eq!(type_name(unwrap_result(&plain)), "u64");
    }

    #[test]
    fn method_facts_strip_mapper_attributes() {
        let mut method: TraitItemFn = parse_quote! {
            #[sql("insert into users(name) values($1)")]
            #[return_generated_id]
            #[doc = "insert a user"]
            fn insert(&self, name: String) -> Result<i64, MangoError>;
        };

        let facts = take_method_facts(&mut method).unwrap();
        assert_eq!(facts.name, "insert");
        assert_eq!(facts.sql.as_deref(), Some("insert into users(name) values($1)"));
        assert!(facts.return_generated_id);
        assert_eq!(facts.return_type, ("i64".to_string(), Shape::Plain));
        assert_eq!(facts.parameter_types, vec![("String".to_string(), Shape::Plain)]);
        assert_eq!(method.attrs.len(), 1);
    }

    #[test]
    fn method_without_sql_has_none() {
        let mut method: TraitItemFn = parse_quote! {
            fn touch(&self);
        };

        let facts = take_method_facts(&mut method).unwrap();
        assert_eq!(facts.sql, None);
        assert!(!facts.return_generated_id);
        assert_eq!(facts.generic_return_type, ("()".to_string(), Shape::Plain));
        assert!(facts.parameter_types.is_empty());
    }

    #[test]
    fn sql_attribute_must_be_a_string_literal() {
        let mut method: TraitItemFn = parse_quote! {
            #[sql(42)]
            fn broken(&self);
        };

        assert!(take_method_facts(&mut method).is_err());
    }
}
