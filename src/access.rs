use std::collections::HashSet;

/// The global kill switch: when commands are disabled, only the re-enable
/// command stays reachable.
pub fn gate_allows(commands_enabled: bool, is_reenable: bool) -> bool {
    commands_enabled || is_reenable
}

/// Role membership and process-wide toggles. Lives behind a mutex in
/// `AppState`; seeded from config at startup, mutated by admin commands.
pub struct AccessControl {
    admins: HashSet<i64>,
    vips: HashSet<i64>,
    allowed_groups: HashSet<i64>,
    pub commands_enabled: bool,
    pub promotion_message: String,
}

impl AccessControl {
    pub fn new(admins: &[i64], vips: &[i64], allowed_groups: &[i64]) -> Self {
        Self {
            admins: admins.iter().copied().collect(),
            vips: vips.iter().copied().collect(),
            allowed_groups: allowed_groups.iter().copied().collect(),
            commands_enabled: true,
            promotion_message: String::new(),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }

    pub fn is_vip(&self, user_id: i64) -> bool {
        self.vips.contains(&user_id)
    }

    pub fn is_allowed_group(&self, group_id: i64) -> bool {
        self.allowed_groups.contains(&group_id)
    }

    pub fn add_admin(&mut self, user_id: i64) -> bool {
        self.admins.insert(user_id)
    }

    pub fn remove_admin(&mut self, user_id: i64) -> bool {
        self.admins.remove(&user_id)
    }

    pub fn admin_ids(&self) -> Vec<i64> {
        self.admins.iter().copied().collect()
    }

    pub fn add_vip(&mut self, user_id: i64) -> bool {
        self.vips.insert(user_id)
    }

    pub fn remove_vip(&mut self, user_id: i64) -> bool {
        self.vips.remove(&user_id)
    }

    pub fn vip_ids(&self) -> Vec<i64> {
        self.vips.iter().copied().collect()
    }

    pub fn allow_group(&mut self, group_id: i64) -> bool {
        self.allowed_groups.insert(group_id)
    }

    pub fn remove_group(&mut self, group_id: i64) -> bool {
        self.allowed_groups.remove(&group_id)
    }

    pub fn allowed_group_ids(&self) -> Vec<i64> {
        self.allowed_groups.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_allows_everything_when_enabled() {
        assert!(gate_allows(true, false));
        assert!(gate_allows(true, true));
    }

    #[test]
    fn test_gate_blocks_all_but_reenable_when_disabled() {
        assert!(!gate_allows(false, false));
        assert!(gate_allows(false, true));
    }

    #[test]
    fn test_role_membership() {
        let access = AccessControl::new(&[1], &[2], &[-100]);
        assert!(access.is_admin(1));
        assert!(!access.is_admin(2));
        assert!(access.is_vip(2));
        assert!(!access.is_vip(1));
        assert!(access.is_allowed_group(-100));
        assert!(!access.is_allowed_group(-200));
    }

    #[test]
    fn test_add_remove_roles() {
        let mut access = AccessControl::new(&[], &[], &[]);
        assert!(access.add_vip(5));
        assert!(!access.add_vip(5)); // already present
        assert!(access.is_vip(5));
        assert!(access.remove_vip(5));
        assert!(!access.remove_vip(5)); // already gone
        assert!(!access.is_vip(5));
    }

    #[test]
    fn test_group_management() {
        let mut access = AccessControl::new(&[], &[], &[-1]);
        assert!(access.allow_group(-2));
        assert!(access.remove_group(-1));
        assert_eq!(access.allowed_group_ids(), vec![-2]);
    }

    #[test]
    fn test_switch_starts_enabled() {
        let access = AccessControl::new(&[], &[], &[]);
        assert!(access.commands_enabled);
    }
}
