use crate::domain::model::{normalize_name, Attendee, Group, GroupSet};
use crate::utils::error::{GroupsError, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffles a copy of `attendees` and deals them round-robin into
/// `group_count` groups numbered from 1.
pub fn shuffle(attendees: &[Attendee], group_count: usize) -> Result<GroupSet> {
    shuffle_with_rng(attendees, group_count, &mut rand::thread_rng())
}

pub fn shuffle_with_rng<R: Rng + ?Sized>(
    attendees: &[Attendee],
    group_count: usize,
    rng: &mut R,
) -> Result<GroupSet> {
    if group_count == 0 {
        return Err(GroupsError::invalid_argument(
            "group_count must be greater than 0",
        ));
    }
    if attendees.is_empty() {
        return Err(GroupsError::invalid_argument(
            "attendee list cannot be empty",
        ));
    }
    let group_count_u32 = u32::try_from(group_count)
        .map_err(|_| GroupsError::invalid_argument("group_count is too large"))?;

    let mut shuffled = attendees.to_vec();
    shuffled.shuffle(rng);

    // group_count 大於人數時，後面的組別保持空白
    let mut groups: Vec<Group> = (1..=group_count_u32).map(Group::new).collect();
    for (i, attendee) in shuffled.into_iter().enumerate() {
        groups[i % group_count].members.push(attendee);
    }

    tracing::debug!(
        "Shuffled {} attendees into {} groups",
        attendees.len(),
        group_count
    );
    Ok(GroupSet(groups))
}

/// Position of a member as (group index, member index).
type Slot = (usize, usize);

fn locate(groups: &GroupSet, name: &str) -> Option<Slot> {
    let wanted = normalize_name(name);
    groups
        .groups()
        .iter()
        .enumerate()
        .find_map(|(group_idx, group)| {
            group
                .members
                .iter()
                .position(|member| member.lookup_key().as_deref() == Some(wanted.as_str()))
                .map(|member_idx| (group_idx, member_idx))
        })
}

/// Exchanges two named members. When a name occurs more than once the first
/// occurrence (group order, then member order) is used.
pub fn swap(mut groups: GroupSet, name_one: &str, name_two: &str) -> Result<GroupSet> {
    let first = locate(&groups, name_one)
        .ok_or_else(|| GroupsError::not_found(format!("'{}' is not in any group", name_one)))?;
    let second = locate(&groups, name_two)
        .ok_or_else(|| GroupsError::not_found(format!("'{}' is not in any group", name_two)))?;

    if first.0 == second.0 {
        groups.0[first.0].members.swap(first.1, second.1);
    } else {
        let (lo, hi) = if first.0 < second.0 {
            (first, second)
        } else {
            (second, first)
        };
        let (left, right) = groups.0.split_at_mut(hi.0);
        std::mem::swap(&mut left[lo.0].members[lo.1], &mut right[0].members[hi.1]);
    }

    tracing::debug!(
        "Swapped '{}' (group {}) with '{}' (group {})",
        name_one,
        first.0 + 1,
        name_two,
        second.0 + 1
    );
    Ok(groups)
}
