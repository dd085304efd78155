//! Static role and mission configuration.
//!
//! Everything here is immutable lookup data keyed by role or player count.
//! Capabilities ("who perceives whom") live in [`RoleInfo`] rows rather than
//! in behaviour on `Role`, so adding a role means adding a row.
//!
//! ## Role multisets
//!
//! | players | good | evil |
//! |---------|------|------|
//! | 5       | 3    | 2    |
//! | 6       | 4    | 2    |
//! | 7       | 4    | 3    |
//! | 8       | 5    | 3    |
//! | 9       | 6    | 3    |
//! | 10      | 6    | 4    |

use serde::{Deserialize, Serialize};

/// Fewest players a game can start with.
pub const MIN_PLAYERS: usize = 5;

/// Most players a game can hold.
pub const MAX_PLAYERS: usize = 10;

/// Missions in a full game.
pub const MISSION_COUNT: usize = 5;

/// Mission results (of either kind) that decide the mission track.
pub const MISSIONS_TO_WIN: usize = 3;

/// Rejected proposals in a row that hand the game to Evil.
pub const MAX_CONSECUTIVE_REJECTIONS: u32 = 5;

/// Opposing sides. `None` means "not dealt yet" on a player and
/// "undecided" as a winner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Faction {
    Good,
    Evil,
    #[default]
    None,
}

/// Every role that can be dealt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Informed seer: sees Evil (except Mordred). The assassin's target.
    Merlin,
    /// Sees Merlin and Morgana without knowing which is which.
    Percival,
    LoyalServant,
    /// Gets the final shot at Merlin.
    Assassin,
    /// Looks like Merlin to Percival.
    Morgana,
    /// Invisible to Merlin.
    Mordred,
    /// Neither sees nor is seen by the rest of Evil.
    Oberon,
    EvilServant,
}

impl Role {
    /// All roles in catalog order.
    pub const ALL: [Role; 8] = [
        Role::Merlin,
        Role::Percival,
        Role::LoyalServant,
        Role::Assassin,
        Role::Morgana,
        Role::Mordred,
        Role::Oberon,
        Role::EvilServant,
    ];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Merlin => "Merlin",
            Role::Percival => "Percival",
            Role::LoyalServant => "Loyal Servant",
            Role::Assassin => "Assassin",
            Role::Morgana => "Morgana",
            Role::Mordred => "Mordred",
            Role::Oberon => "Oberon",
            Role::EvilServant => "Evil Servant",
        };
        f.write_str(name)
    }
}

/// One row of the role table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleInfo {
    pub role: Role,
    pub faction: Faction,
    /// Perceives Evil membership (subject to the hiding flags below).
    pub sees_evil: bool,
    /// Sees the seer candidates (Merlin and Morgana) unlabeled.
    pub sees_seer_candidates: bool,
    /// Shows up as a seer candidate to second-sight roles.
    pub seer_candidate: bool,
    /// Hidden from Merlin's view of Evil.
    pub hidden_from_seer: bool,
    /// Hidden from, and blind to, the rest of Evil.
    pub isolated_evil: bool,
}

const fn row(role: Role, faction: Faction, sees_evil: bool) -> RoleInfo {
    RoleInfo {
        role,
        faction,
        sees_evil,
        sees_seer_candidates: false,
        seer_candidate: false,
        hidden_from_seer: false,
        isolated_evil: false,
    }
}

/// Indexed by `Role as usize`; order must follow `Role::ALL`.
const ROLE_TABLE: [RoleInfo; 8] = [
    RoleInfo {
        seer_candidate: true,
        ..row(Role::Merlin, Faction::Good, true)
    },
    RoleInfo {
        sees_seer_candidates: true,
        ..row(Role::Percival, Faction::Good, false)
    },
    row(Role::LoyalServant, Faction::Good, false),
    row(Role::Assassin, Faction::Evil, true),
    RoleInfo {
        seer_candidate: true,
        ..row(Role::Morgana, Faction::Evil, true)
    },
    RoleInfo {
        hidden_from_seer: true,
        ..row(Role::Mordred, Faction::Evil, true)
    },
    RoleInfo {
        isolated_evil: true,
        ..row(Role::Oberon, Faction::Evil, false)
    },
    row(Role::EvilServant, Faction::Evil, true),
];

use Role::{
    Assassin as A, EvilServant as E, LoyalServant as L, Merlin as M, Mordred as D, Morgana as G,
    Oberon as O, Percival as P,
};

const ROLES_5: [Role; 5] = [M, A, L, L, E];
const ROLES_6: [Role; 6] = [M, A, L, L, L, E];
const ROLES_7: [Role; 7] = [M, A, P, G, L, L, E];
const ROLES_8: [Role; 8] = [M, A, P, G, L, L, L, E];
const ROLES_9: [Role; 9] = [M, A, P, G, D, L, L, L, L];
const ROLES_10: [Role; 10] = [M, A, P, G, D, O, L, L, L, L];

const MISSION_SIZES: [[usize; MISSION_COUNT]; 6] = [
    [2, 3, 2, 3, 3],
    [2, 3, 4, 3, 4],
    [2, 3, 3, 4, 4],
    [3, 4, 4, 5, 5],
    [3, 4, 4, 5, 5],
    [3, 4, 4, 5, 5],
];

/// Mission index (0-based) that needs two sabotage votes in large games.
const DOUBLE_FAIL_MISSION: usize = 3;

/// Smallest game in which the double-fail mission applies.
const DOUBLE_FAIL_MIN_PLAYERS: usize = 7;

/// Pure lookup over the static tables. Holds no state.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoleCatalog;

impl RoleCatalog {
    /// Table row for a role.
    #[must_use]
    pub fn info(role: Role) -> &'static RoleInfo {
        &ROLE_TABLE[role as usize]
    }

    /// Faction a role belongs to.
    #[must_use]
    pub fn faction(role: Role) -> Faction {
        Self::info(role).faction
    }

    /// Whether `player_count` has a catalog entry.
    #[must_use]
    pub fn supports(player_count: usize) -> bool {
        (MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count)
    }

    /// Roles to deal for an exact player count, in catalog order.
    ///
    /// ```
    /// use avalon_rules::core::{Role, RoleCatalog};
    ///
    /// let roles = RoleCatalog::roles_for(5).unwrap();
    /// assert_eq!(roles.len(), 5);
    /// assert!(roles.contains(&Role::Merlin));
    /// assert!(RoleCatalog::roles_for(4).is_none());
    /// ```
    #[must_use]
    pub fn roles_for(player_count: usize) -> Option<&'static [Role]> {
        let roles: &'static [Role] = match player_count {
            5 => &ROLES_5,
            6 => &ROLES_6,
            7 => &ROLES_7,
            8 => &ROLES_8,
            9 => &ROLES_9,
            10 => &ROLES_10,
            _ => return None,
        };
        Some(roles)
    }

    /// Team sizes for all five missions.
    #[must_use]
    pub fn mission_sizes(player_count: usize) -> Option<&'static [usize; MISSION_COUNT]> {
        if !Self::supports(player_count) {
            return None;
        }
        Some(&MISSION_SIZES[player_count - MIN_PLAYERS])
    }

    /// Required team size for one mission.
    #[must_use]
    pub fn team_size(player_count: usize, mission: usize) -> Option<usize> {
        Self::mission_sizes(player_count).and_then(|sizes| sizes.get(mission).copied())
    }

    /// Sabotage votes needed to fail a mission.
    ///
    /// ```
    /// use avalon_rules::core::RoleCatalog;
    ///
    /// assert_eq!(RoleCatalog::fails_required(7, 3), 2);
    /// assert_eq!(RoleCatalog::fails_required(6, 3), 1);
    /// assert_eq!(RoleCatalog::fails_required(10, 2), 1);
    /// ```
    #[must_use]
    pub fn fails_required(player_count: usize, mission: usize) -> usize {
        if mission == DOUBLE_FAIL_MISSION && player_count >= DOUBLE_FAIL_MIN_PLAYERS {
            2
        } else {
            1
        }
    }

    /// (good, evil) split for a player count.
    #[must_use]
    pub fn faction_split(player_count: usize) -> Option<(usize, usize)> {
        let roles = Self::roles_for(player_count)?;
        let evil = roles
            .iter()
            .filter(|&&r| Self::faction(r) == Faction::Evil)
            .count();
        Some((roles.len() - evil, evil))
    }
}
