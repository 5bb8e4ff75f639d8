//! Read-only view of a module for host UIs.
//!
//! Visibility is derived from the simulation state on demand instead of being
//! stored next to it.

use crate::inflation::BuoyancyCommand;
use crate::part::{BuoyancyModule, PartBuoyancy};

/// Where a command is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiVisibility {
    pub flight: bool,
    pub editor: bool,
}

impl UiVisibility {
    const HIDDEN: Self = Self {
        flight: false,
        editor: false,
    };
    const EVERYWHERE: Self = Self {
        flight: true,
        editor: true,
    };
    const FLIGHT: Self = Self {
        flight: true,
        editor: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: BuoyancyCommand,
    pub label: String,
    pub visibility: UiVisibility,
    /// Whether the command can be bound to an action group.
    pub action_group: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    InflatedForce,
    AutoDeploy,
    Inflated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub kind: FieldKind,
    pub label: &'static str,
    pub value: String,
    pub visibility: UiVisibility,
}

pub struct ModuleView<'a> {
    module: &'a BuoyancyModule,
}

impl<'a> ModuleView<'a> {
    pub fn new(module: &'a BuoyancyModule) -> Self {
        Self { module }
    }

    pub fn for_part(part: &'a PartBuoyancy) -> impl Iterator<Item = ModuleView<'a>> {
        part.modules().iter().map(ModuleView::new)
    }

    pub fn is_master(&self) -> bool {
        self.module.state.is_master
    }

    pub fn current_force(&self) -> f32 {
        self.module.state.current_force
    }

    pub fn commands(&self) -> Vec<CommandEntry> {
        let master = self.is_master();
        let debug = master && self.module.config.debug_mode;
        let suffix = self
            .module
            .config
            .force_point_name()
            .map(|name| format!(" {name}"));

        let adjust_label = |verb: &str| match &suffix {
            Some(name) => format!("{verb} buoy{name}"),
            None => format!("{verb} buoyancy"),
        };

        vec![
            CommandEntry {
                command: BuoyancyCommand::ToggleInflate,
                label: "Inflate / Deflate".to_string(),
                visibility: if master {
                    UiVisibility::EVERYWHERE
                } else {
                    UiVisibility::HIDDEN
                },
                action_group: master,
            },
            CommandEntry {
                command: BuoyancyCommand::ToggleAutoDeploy,
                label: "Toggle Auto deploy".to_string(),
                visibility: if master {
                    UiVisibility::EVERYWHERE
                } else {
                    UiVisibility::HIDDEN
                },
                action_group: master,
            },
            CommandEntry {
                command: BuoyancyCommand::IncreaseForce,
                label: adjust_label("increase"),
                visibility: if debug {
                    UiVisibility::FLIGHT
                } else {
                    UiVisibility::HIDDEN
                },
                action_group: false,
            },
            CommandEntry {
                command: BuoyancyCommand::DecreaseForce,
                label: adjust_label("decrease"),
                visibility: if debug {
                    UiVisibility::FLIGHT
                } else {
                    UiVisibility::HIDDEN
                },
                action_group: false,
            },
        ]
    }

    pub fn fields(&self) -> Vec<FieldEntry> {
        let state = &self.module.state;
        let master = state.is_master;
        vec![
            FieldEntry {
                kind: FieldKind::InflatedForce,
                label: "Force",
                value: format!("{:.1}", state.inflated_force),
                visibility: if master {
                    UiVisibility::FLIGHT
                } else {
                    UiVisibility::HIDDEN
                },
            },
            FieldEntry {
                kind: FieldKind::AutoDeploy,
                label: "Auto Deploy",
                value: if state.auto_deploy { "Enabled" } else { "Disabled" }.to_string(),
                visibility: if master {
                    UiVisibility::EVERYWHERE
                } else {
                    UiVisibility::HIDDEN
                },
            },
            FieldEntry {
                kind: FieldKind::Inflated,
                label: "Inflated",
                value: state.is_inflated().to_string(),
                visibility: if master && self.module.config.debug_mode {
                    UiVisibility::FLIGHT
                } else {
                    UiVisibility::HIDDEN
                },
            },
        ]
    }

    /// Commands the host should offer in its action-group editor.
    pub fn action_group_commands(&self) -> Vec<BuoyancyCommand> {
        self.commands()
            .into_iter()
            .filter(|c| c.action_group)
            .map(|c| c.command)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuoyancyConfig;
    use crate::part::ModuleSpec;

    fn part(debug_mode: bool) -> PartBuoyancy {
        let (part, _) = PartBuoyancy::spawn(
            vec![
                ModuleSpec::new(BuoyancyConfig {
                    debug_mode,
                    force_point: Some("bow".into()),
                    ..Default::default()
                }),
                ModuleSpec::new(BuoyancyConfig {
                    master: false,
                    ..Default::default()
                }),
            ],
            &["bow"],
        )
        .unwrap();
        part
    }

    #[test]
    fn test_master_exposes_toggles() {
        let part = part(false);
        let views: Vec<_> = ModuleView::for_part(&part).collect();

        assert_eq!(
            views[0].action_group_commands(),
            vec![
                BuoyancyCommand::ToggleInflate,
                BuoyancyCommand::ToggleAutoDeploy
            ]
        );
        let adjust = &views[0].commands()[2];
        assert_eq!(adjust.visibility, UiVisibility::HIDDEN);
    }

    #[test]
    fn test_child_exposes_nothing() {
        let part = part(true);
        let child = ModuleView::new(&part.modules()[1]);
        assert!(child.action_group_commands().is_empty());
        assert!(child
            .commands()
            .iter()
            .all(|c| c.visibility == UiVisibility::HIDDEN));
        assert!(child
            .fields()
            .iter()
            .all(|f| f.visibility == UiVisibility::HIDDEN));
    }

    #[test]
    fn test_debug_mode_labels_adjust_commands_with_force_point() {
        let part = part(true);
        let master = ModuleView::new(&part.modules()[0]);
        let commands = master.commands();
        assert_eq!(commands[2].label, "increase buoy bow");
        assert_eq!(commands[3].label, "decrease buoy bow");
        assert!(commands[2].visibility.flight);

        let inflated = master
            .fields()
            .into_iter()
            .find(|f| f.kind == FieldKind::Inflated)
            .unwrap();
        assert_eq!(inflated.value, "false");
        assert!(inflated.visibility.flight);
    }
}
