//! Address construction helpers shared by every handler.
//!
//! An address is built by appending a child fragment to its parent's address:
//! `.name` for named members, `[i]` for positions, `[i,j]` for rectangular
//! arrays and `@name` for attributes. An empty parent yields the bare fragment.

/// Default separator between a parent address and a named child.
pub const DEFAULT_SEPARATOR: &str = ".";

/// `prefix.name`, or `name` when the prefix is empty.
pub fn member(prefix: &str, name: &str) -> String {
    member_with(prefix, DEFAULT_SEPARATOR, name)
}

/// `prefix<separator>name`, or `name` when the prefix is empty.
pub fn member_with(prefix: &str, separator: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        let mut address = String::with_capacity(prefix.len() + separator.len() + name.len());
        address.push_str(prefix);
        address.push_str(separator);
        address.push_str(name);
        address
    }
}

/// `prefix<separator>@name`.
pub fn attribute(prefix: &str, separator: &str, name: &str) -> String {
    member_with(prefix, separator, &format!("@{}", name))
}

/// `prefix[index]`. Positional fragments never take a separator.
pub fn index(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}

/// `prefix[i,j,...]` for one element of a rectangular array.
pub fn indices(prefix: &str, indices: &[isize]) -> String {
    let joined = indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}[{}]", prefix, joined)
}

/// `[name]`, or `["name"]` when the name itself contains a bracket.
pub fn bracketed(name: &str) -> String {
    if name.contains('[') || name.contains(']') {
        format!("[\"{}\"]", name)
    } else {
        format!("[{}]", name)
    }
}

/// Concatenates fragments that carry their own delimiters, e.g. `table[0][Col]`.
pub fn concat(prefix: &str, fragments: &[&str]) -> String {
    let mut address = prefix.to_string();
    for fragment in fragments {
        address.push_str(fragment);
    }
    address
}
