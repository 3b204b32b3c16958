//! Name helpers shared by topology and endpoint conventions.

/// Last path segment of a `std::any::type_name` string, generics stripped.
///
/// `my_app::events::OrderCreated` becomes `OrderCreated`.
pub(crate) fn short_type_name(full_name: &str) -> &str {
    let base = full_name.split('<').next().unwrap_or(full_name);
    base.rsplit("::").next().unwrap_or(base)
}

/// Kebab-case endpoint name for a type name.
///
/// `OrderCreatedConsumer` becomes `order-created-consumer`, `HTTPPinger`
/// becomes `http-pinger`.
pub(crate) fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == ' ' {
            if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
        }

        out.extend(c.to_lowercase());
    }

    out
}
