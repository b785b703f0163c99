use std::collections::HashMap;

use chrono::NaiveDate;

#[derive(Debug, Clone)]
struct GroupQuota {
    used: u32,
    limit: u32,
    last_reset: NaiveDate,
}

#[derive(Debug, Clone)]
struct UserQuota {
    last_used: NaiveDate,
    count: u32,
}

/// Outcome of an atomic group+user reservation for one like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Reserved,
    GroupLimitReached,
    UserAlreadyUsed,
}

/// In-memory daily counters for groups and users. All operations take `today`
/// so the caller owns the clock; state lives behind one mutex in `AppState`.
pub struct QuotaStore {
    groups: HashMap<i64, GroupQuota>,
    users: HashMap<i64, UserQuota>,
    default_limit: u32,
}

impl QuotaStore {
    pub fn new(default_limit: u32) -> Self {
        Self {
            groups: HashMap::new(),
            users: HashMap::new(),
            default_limit,
        }
    }

    fn group_entry(&mut self, group_id: i64, today: NaiveDate) -> &mut GroupQuota {
        let entry = self.groups.entry(group_id).or_insert(GroupQuota {
            used: 0,
            limit: self.default_limit,
            last_reset: today,
        });
        // Lazy reset on the first touch of a new calendar day. The scheduled
        // reset stamps the same date, so whichever runs first wins and the
        // other is a no-op.
        if entry.last_reset != today {
            entry.used = 0;
            entry.last_reset = today;
        }
        entry
    }

    pub fn group_status(&mut self, group_id: i64, today: NaiveDate) -> (u32, u32) {
        let entry = self.group_entry(group_id, today);
        (entry.used, entry.limit)
    }

    pub fn set_group_limit(&mut self, group_id: i64, limit: u32, today: NaiveDate) {
        self.group_entry(group_id, today).limit = limit;
    }

    pub fn forget_group(&mut self, group_id: i64) {
        self.groups.remove(&group_id);
    }

    pub fn try_consume_group(&mut self, group_id: i64, today: NaiveDate) -> bool {
        let entry = self.group_entry(group_id, today);
        if entry.used >= entry.limit {
            return false;
        }
        entry.used += 1;
        true
    }

    pub fn try_consume_user(&mut self, user_id: i64, today: NaiveDate) -> bool {
        match self.users.get_mut(&user_id) {
            Some(entry) if entry.last_used == today && entry.count >= 1 => false,
            Some(entry) => {
                if entry.last_used != today {
                    entry.count = 0;
                    entry.last_used = today;
                }
                entry.count += 1;
                true
            }
            None => {
                self.users.insert(
                    user_id,
                    UserQuota {
                        last_used: today,
                        count: 1,
                    },
                );
                true
            }
        }
    }

    /// Take one unit of group quota and, for non-VIP callers, the user's
    /// daily slot, in a single step. A user denial hands the group unit back
    /// so a rejected attempt costs the group nothing.
    pub fn reserve(&mut self, group_id: i64, user: Option<i64>, today: NaiveDate) -> Reservation {
        if !self.try_consume_group(group_id, today) {
            return Reservation::GroupLimitReached;
        }
        if let Some(user_id) = user {
            if !self.try_consume_user(user_id, today) {
                self.release_group(group_id);
                return Reservation::UserAlreadyUsed;
            }
        }
        Reservation::Reserved
    }

    /// Hand back a reservation after a failed like call.
    pub fn release(&mut self, group_id: i64, user: Option<i64>) {
        self.release_group(group_id);
        if let Some(user_id) = user {
            if let Some(entry) = self.users.get_mut(&user_id) {
                entry.count = entry.count.saturating_sub(1);
            }
        }
    }

    fn release_group(&mut self, group_id: i64) {
        if let Some(entry) = self.groups.get_mut(&group_id) {
            entry.used = entry.used.saturating_sub(1);
        }
    }

    pub fn user_usage(&self, user_id: i64, today: NaiveDate) -> u32 {
        self.users
            .get(&user_id)
            .filter(|entry| entry.last_used == today)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn reset_all_groups(&mut self, today: NaiveDate) {
        for entry in self.groups.values_mut() {
            entry.used = 0;
            entry.last_reset = today;
        }
    }

    pub fn users_used_today(&self, today: NaiveDate) -> usize {
        self.users
            .values()
            .filter(|entry| entry.last_used == today && entry.count > 0)
            .count()
    }

    pub fn known_user_ids(&self) -> Vec<i64> {
        self.users.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, n).unwrap()
    }

    #[test]
    fn test_group_consumes_up_to_limit() {
        let mut store = QuotaStore::new(3);
        for _ in 0..3 {
            assert!(store.try_consume_group(1, day(1)));
        }
        assert!(!store.try_consume_group(1, day(1)));
        assert_eq!(store.group_status(1, day(1)), (3, 3));
    }

    #[test]
    fn test_group_lazy_reset_next_day() {
        let mut store = QuotaStore::new(2);
        assert!(store.try_consume_group(1, day(1)));
        assert!(store.try_consume_group(1, day(1)));
        assert!(!store.try_consume_group(1, day(1)));
        // New day: counter starts over
        assert_eq!(store.group_status(1, day(2)), (0, 2));
        assert!(store.try_consume_group(1, day(2)));
    }

    #[test]
    fn test_group_status_idempotent_within_day() {
        let mut store = QuotaStore::new(5);
        store.try_consume_group(1, day(1));
        let first = store.group_status(1, day(1));
        let second = store.group_status(1, day(1));
        assert_eq!(first, second);
        assert_eq!(first, (1, 5));
    }

    #[test]
    fn test_per_group_limit_override() {
        let mut store = QuotaStore::new(30);
        store.set_group_limit(1, 1, day(1));
        assert!(store.try_consume_group(1, day(1)));
        assert!(!store.try_consume_group(1, day(1)));
        // Other groups keep the default
        assert_eq!(store.group_status(2, day(1)), (0, 30));
    }

    #[test]
    fn test_limit_override_survives_reset() {
        let mut store = QuotaStore::new(30);
        store.set_group_limit(1, 5, day(1));
        store.reset_all_groups(day(2));
        assert_eq!(store.group_status(1, day(2)), (0, 5));
    }

    #[test]
    fn test_user_once_per_day() {
        let mut store = QuotaStore::new(30);
        assert!(store.try_consume_user(7, day(1)));
        assert!(!store.try_consume_user(7, day(1)));
        assert_eq!(store.user_usage(7, day(1)), 1);
        // Next day the slot is free again
        assert!(store.try_consume_user(7, day(2)));
        assert_eq!(store.user_usage(7, day(2)), 1);
    }

    #[test]
    fn test_user_usage_zero_for_stale_record() {
        let mut store = QuotaStore::new(30);
        store.try_consume_user(7, day(1));
        assert_eq!(store.user_usage(7, day(2)), 0);
    }

    #[test]
    fn test_reserve_vip_skips_user_check() {
        let mut store = QuotaStore::new(30);
        // VIP (user: None) can reserve repeatedly the same day
        assert_eq!(store.reserve(1, None, day(1)), Reservation::Reserved);
        assert_eq!(store.reserve(1, None, day(1)), Reservation::Reserved);
        assert_eq!(store.group_status(1, day(1)), (2, 30));
    }

    #[test]
    fn test_reserve_user_denial_returns_group_unit() {
        let mut store = QuotaStore::new(30);
        assert_eq!(store.reserve(1, Some(7), day(1)), Reservation::Reserved);
        assert_eq!(
            store.reserve(1, Some(7), day(1)),
            Reservation::UserAlreadyUsed
        );
        // The denied attempt must not have burned a group unit
        assert_eq!(store.group_status(1, day(1)), (1, 30));
    }

    #[test]
    fn test_reserve_group_exhausted() {
        let mut store = QuotaStore::new(1);
        assert_eq!(store.reserve(1, Some(7), day(1)), Reservation::Reserved);
        assert_eq!(
            store.reserve(1, Some(8), day(1)),
            Reservation::GroupLimitReached
        );
        // User 8 keeps their daily slot for another group
        assert!(store.try_consume_user(8, day(1)));
    }

    #[test]
    fn test_release_undoes_reservation() {
        let mut store = QuotaStore::new(1);
        assert_eq!(store.reserve(1, Some(7), day(1)), Reservation::Reserved);
        store.release(1, Some(7));
        assert_eq!(store.group_status(1, day(1)), (0, 1));
        // Both the group unit and the user's daily slot are usable again
        assert_eq!(store.reserve(1, Some(7), day(1)), Reservation::Reserved);
    }

    #[test]
    fn test_release_saturates_at_zero() {
        let mut store = QuotaStore::new(5);
        store.release(1, Some(7));
        assert_eq!(store.group_status(1, day(1)), (0, 5));
    }

    #[test]
    fn test_reset_all_groups_clears_counters() {
        let mut store = QuotaStore::new(5);
        store.try_consume_group(1, day(1));
        store.try_consume_group(2, day(1));
        store.reset_all_groups(day(1));
        assert_eq!(store.group_status(1, day(1)), (0, 5));
        assert_eq!(store.group_status(2, day(1)), (0, 5));
    }

    #[test]
    fn test_scheduled_then_lazy_reset_no_double_count() {
        let mut store = QuotaStore::new(5);
        store.try_consume_group(1, day(1));
        // Scheduler fires at the day-2 boundary
        store.reset_all_groups(day(2));
        // A later consume on day 2 must see a fresh counter, not reset again
        assert!(store.try_consume_group(1, day(2)));
        assert_eq!(store.group_status(1, day(2)), (1, 5));
    }

    #[test]
    fn test_forget_group_discards_history() {
        let mut store = QuotaStore::new(30);
        store.set_group_limit(1, 2, day(1));
        store.try_consume_group(1, day(1));
        store.forget_group(1);
        // Recreated with defaults
        assert_eq!(store.group_status(1, day(1)), (0, 30));
    }

    #[test]
    fn test_users_used_today() {
        let mut store = QuotaStore::new(30);
        store.try_consume_user(7, day(1));
        store.try_consume_user(8, day(1));
        store.try_consume_user(9, day(2));
        assert_eq!(store.users_used_today(day(2)), 1);
        assert_eq!(store.known_user_ids().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_last_unit() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let store = Arc::new(Mutex::new(QuotaStore::new(10)));
        for _ in 0..9 {
            store.lock().await.try_consume_group(1, day(1));
        }

        // Ten callers race for the single remaining unit
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.lock().await.reserve(1, Some(100 + i), day(1))
            }));
        }

        let mut reserved = 0;
        let mut denied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Reservation::Reserved => reserved += 1,
                Reservation::GroupLimitReached => denied += 1,
                Reservation::UserAlreadyUsed => unreachable!(),
            }
        }
        assert_eq!(reserved, 1);
        assert_eq!(denied, 9);
        assert_eq!(store.lock().await.group_status(1, day(1)), (10, 10));
    }
}
