use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const MAX_LABEL_CHARS: usize = 30;
const TRUNCATED_LABEL_CHARS: usize = 27;

pub fn module_short_name(module: &str) -> &str {
    module
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(module)
}

pub fn truncate_label(name: &str) -> String {
    if name.chars().count() <= MAX_LABEL_CHARS {
        return name.to_owned();
    }

    let mut label = name.chars().take(TRUNCATED_LABEL_CHARS).collect::<String>();
    label.push_str("...");
    label
}

/// Deterministic pair in `[-1, 1]` derived from an id, used wherever a node
/// needs jitter that is stable across runs.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_short_name_takes_last_segment() {
        assert_eq!(module_short_name("app/api/routes.py"), "routes.py");
        assert_eq!(module_short_name("app\\models.py"), "models.py");
        assert_eq!(module_short_name("backend.app.main"), "backend.app.main");
        assert_eq!(module_short_name("trailing/"), "trailing/");
    }

    #[test]
    fn long_labels_are_shortened() {
        assert_eq!(truncate_label("send_email"), "send_email");
        let long = "generate_reset_password_email_for_user";
        let label = truncate_label(long);
        assert_eq!(label.chars().count(), 30);
        assert!(label.ends_with("..."));
        assert!(long.starts_with(label.trim_end_matches("...")));
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("module.declA");
        assert_eq!(first, stable_pair("module.declA"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }
}
