#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Module,
    Class,
    Function,
    Handler,
    SqlClass,
    Declaration,
    CallTarget,
}

/// Per-kind physics and visual treatment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindProfile {
    pub label: &'static str,
    /// Multiplier applied to the global repulsion magnitude.
    pub charge: f32,
    pub collision_radius: f32,
    /// Attractor offset in units of the cluster distance, relative to the
    /// layout center. `None` for kinds that are not clustered.
    pub cluster_anchor: Option<[f32; 2]>,
    /// Link length factor for edges from a node of this kind to its children.
    pub child_link_factor: f32,
    pub child_link_strength: Option<f32>,
    pub color: [u8; 3],
}

const PROFILES: [KindProfile; 8] = [
    KindProfile {
        label: "root",
        charge: 1.0,
        collision_radius: 26.0,
        cluster_anchor: None,
        child_link_factor: 0.35,
        child_link_strength: Some(0.15),
        color: [245, 206, 93],
    },
    KindProfile {
        label: "module",
        charge: 2.4,
        collision_radius: 34.0,
        cluster_anchor: None,
        child_link_factor: 1.0,
        child_link_strength: None,
        color: [106, 168, 255],
    },
    KindProfile {
        label: "class",
        charge: 1.0,
        collision_radius: 18.0,
        cluster_anchor: None,
        child_link_factor: 0.6,
        child_link_strength: None,
        color: [163, 140, 230],
    },
    KindProfile {
        label: "function",
        charge: 1.0,
        collision_radius: 16.0,
        cluster_anchor: None,
        child_link_factor: 0.6,
        child_link_strength: None,
        color: [120, 200, 150],
    },
    KindProfile {
        label: "handler",
        charge: 1.0,
        collision_radius: 18.0,
        cluster_anchor: Some([-1.0, -0.7]),
        child_link_factor: 0.6,
        child_link_strength: None,
        color: [241, 146, 94],
    },
    KindProfile {
        label: "sql_class",
        charge: 1.0,
        collision_radius: 18.0,
        cluster_anchor: Some([1.0, -0.7]),
        child_link_factor: 0.6,
        child_link_strength: None,
        color: [230, 110, 140],
    },
    KindProfile {
        label: "declaration",
        charge: 1.0,
        collision_radius: 16.0,
        cluster_anchor: None,
        child_link_factor: 0.6,
        child_link_strength: None,
        color: [150, 160, 175],
    },
    KindProfile {
        label: "call",
        charge: 0.6,
        collision_radius: 11.0,
        cluster_anchor: None,
        child_link_factor: 1.0,
        child_link_strength: None,
        color: [190, 190, 190],
    },
];

impl NodeKind {
    pub fn from_declaration_type(raw: &str) -> Self {
        match raw {
            "class" => Self::Class,
            "function" => Self::Function,
            "handler" => Self::Handler,
            "sql_class" => Self::SqlClass,
            _ => Self::Declaration,
        }
    }

    pub fn profile(self) -> &'static KindProfile {
        &PROFILES[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.profile().label
    }

    pub fn is_clustered(self) -> bool {
        self.profile().cluster_anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_types_map_to_kinds() {
        assert_eq!(NodeKind::from_declaration_type("class"), NodeKind::Class);
        assert_eq!(NodeKind::from_declaration_type("handler"), NodeKind::Handler);
        assert_eq!(NodeKind::from_declaration_type("sql_class"), NodeKind::SqlClass);
        assert_eq!(NodeKind::from_declaration_type("lambda"), NodeKind::Declaration);
    }

    #[test]
    fn profile_table_lines_up_with_variants() {
        assert_eq!(NodeKind::Root.label(), "root");
        assert_eq!(NodeKind::CallTarget.label(), "call");
        assert_eq!(NodeKind::SqlClass.label(), "sql_class");
        assert!(NodeKind::Handler.is_clustered());
        assert!(!NodeKind::Function.is_clustered());
        assert!(NodeKind::Module.profile().charge > NodeKind::CallTarget.profile().charge);
        assert!(
            NodeKind::Module.profile().collision_radius
                > NodeKind::Function.profile().collision_radius
        );
        assert!(
            NodeKind::Root.profile().child_link_factor
                < NodeKind::Module.profile().child_link_factor
        );
    }
}
