//! Identifier generation and name validation.
//!
//! Identifiers double as storage paths, so every user-supplied name is
//! checked with [`is_name_valid`] before an identifier is derived from it.

use rand::Rng;

/// Length of the random lowercase suffix.
pub const SUFFIX_LEN: usize = 8;

/// Warn about a crowded namespace every this many collisions.
const RETRY_WARN_INTERVAL: u32 = 32;

/// Generate `<base>_<suffix>` that `exists` reports as unused.
///
/// Retries with a fresh suffix on every collision. There is no retry bound.
pub fn new_identifier(base: &str, exists: impl FnMut(&str) -> bool) -> String {
    new_identifier_with(&mut rand::thread_rng(), base, exists)
}

/// [`new_identifier`] with an explicit random source.
pub fn new_identifier_with<R: Rng + ?Sized>(
    rng: &mut R,
    base: &str,
    mut exists: impl FnMut(&str) -> bool,
) -> String {
    let mut attempts: u32 = 0;
    loop {
        let candidate = format!("{}_{}", base, random_suffix(rng));
        attempts += 1;
        if !exists(&candidate) {
            return candidate;
        }

        tracing::debug!(base, attempts, %candidate, "identifier collision, retrying");
        if attempts % RETRY_WARN_INTERVAL == 0 {
            tracing::warn!(base, attempts, "identifier namespace is crowded");
        }
    }
}

fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect()
}

/// Check that `name` cannot escape or alias a storage path.
///
/// Rejects absolute names, names starting with `./` or `../`, names ending
/// with `/`, `/.` or `/..`, and names containing `//`, `/./` or `/../`.
///
/// # Examples
///
/// ```
/// use concord_core::is_name_valid;
///
/// assert!(is_name_valid("src/main.rs"));
/// assert!(!is_name_valid("../etc/passwd"));
/// assert!(!is_name_valid("docs/"));
/// ```
pub fn is_name_valid(name: &str) -> bool {
    const BAD_PREFIXES: [&str; 3] = ["/", "./", "../"];
    const BAD_SUFFIXES: [&str; 3] = ["/", "/.", "/.."];
    const BAD_INFIXES: [&str; 3] = ["//", "/./", "/../"];

    !(BAD_PREFIXES.iter().any(|p| name.starts_with(p))
        || BAD_SUFFIXES.iter().any(|s| name.ends_with(s))
        || BAD_INFIXES.iter().any(|i| name.contains(i)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn identifier_shape() {
        let id = new_identifier("notes", |_| false);
        let (base, suffix) = id.rsplit_once('_').unwrap();
        assert_eq!(base, "notes");
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn identifier_avoids_existing() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut existing = HashSet::new();
        for _ in 0..200 {
            let id = new_identifier_with(&mut rng, "main", |c| existing.contains(c));
            assert!(existing.insert(id));
        }
    }

    #[test]
    fn forced_collision_retries_once() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = Vec::new();
        let id = new_identifier_with(&mut rng, "main", |c| {
            seen.push(c.to_string());
            seen.len() == 1
        });

        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
        assert_eq!(id, seen[1]);
    }

    #[test]
    fn rejects_path_unsafe_names() {
        for name in [
            "/abs",
            "/",
            "./x",
            "../x",
            "x/",
            "x/.",
            "x/..",
            "a//b",
            "a/./b",
            "a/../b",
        ] {
            assert!(!is_name_valid(name), "{:?} should be rejected", name);
        }
    }

    #[test]
    fn accepts_everything_else() {
        for name in [
            "main",
            "src/main.rs",
            "a/b/c",
            ".hidden",
            "..dots",
            "x.",
            "a/.b",
            "a/..b",
            "my file",
            "",
        ] {
            assert!(is_name_valid(name), "{:?} should be accepted", name);
        }
    }
}
