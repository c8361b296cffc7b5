//! Time-bounded path cache with path splicing
//!
//! Many units converging on one destination share a single search: a unit
//! standing anywhere on a cached path receives the remaining tail instead of
//! a fresh search. Entries expire after the path recalculation interval and
//! are pruned lazily when their key is looked up.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::battle::occupancy::OccupancyMap;
use crate::battle::pathfinding::{PathOptions, Pathfinder};
use crate::battle::terrain::TerrainMap;
use crate::core::types::{Cell, GameTime, PlayerId};

/// Cached routes kept per key; the oldest is evicted first
const MAX_ROUTES_PER_KEY: usize = 8;

/// Cache key: destination plus everything that changes passability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathKey {
    pub destination: Cell,
    pub respect_occupancy: bool,
    pub owner: PlayerId,
    pub avoid_mines: bool,
}

impl PathKey {
    pub fn new(destination: Cell, owner: PlayerId, options: PathOptions) -> Self {
        Self {
            destination,
            respect_occupancy: options.respect_occupancy,
            owner,
            avoid_mines: options.avoid_mines,
        }
    }
}

/// A stored route and when it was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCacheEntry {
    pub path: Vec<Cell>,
    pub created: GameTime,
}

/// Lookup counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCacheStats {
    /// Requester stood on the first cell of a cached route
    pub hits: u64,
    /// Requester stood further along a cached route
    pub splices: u64,
    pub misses: u64,
    pub unreachable: u64,
    pub expired: u64,
}

#[derive(Debug, Clone)]
pub struct PathCache {
    ttl: GameTime,
    entries: AHashMap<PathKey, Vec<PathCacheEntry>>,
    stats: PathCacheStats,
}

impl PathCache {
    /// `ttl` should equal the path recalculation interval
    pub fn new(ttl: GameTime) -> Self {
        Self {
            ttl,
            entries: AHashMap::new(),
            stats: PathCacheStats::default(),
        }
    }

    pub fn ttl(&self) -> GameTime {
        self.ttl
    }

    /// Path from `start` to `end`, empty when unreachable
    ///
    /// Serves the tail of a fresh cached route when `start` lies on it,
    /// otherwise runs `pathfinder` and stores the result.
    #[allow(clippy::too_many_arguments)]
    pub fn get_path<P: Pathfinder + ?Sized>(
        &mut self,
        pathfinder: &P,
        start: Cell,
        end: Cell,
        terrain: &TerrainMap,
        occupancy: &OccupancyMap,
        owner: PlayerId,
        options: PathOptions,
        now: GameTime,
    ) -> Vec<Cell> {
        let key = PathKey::new(end, owner, options);

        if let Some(routes) = self.entries.get_mut(&key) {
            let before = routes.len();
            let ttl = self.ttl;
            routes.retain(|entry| now.saturating_sub(entry.created) <= ttl);
            self.stats.expired += (before - routes.len()) as u64;

            for entry in routes.iter() {
                if let Some(pos) = entry.path.iter().position(|c| *c == start) {
                    if pos == 0 {
                        self.stats.hits += 1;
                    } else {
                        self.stats.splices += 1;
                    }
                    trace!(?start, ?end, offset = pos, "Path cache hit");
                    return entry.path[pos..].to_vec();
                }
            }

            if routes.is_empty() {
                self.entries.remove(&key);
            }
        }

        self.stats.misses += 1;
        let path = pathfinder.find_path(start, end, terrain, occupancy, owner, options);
        if path.is_empty() {
            self.stats.unreachable += 1;
            debug!(?start, ?end, owner = owner.0, "No path");
            return path;
        }

        let routes = self.entries.entry(key).or_default();
        if routes.len() >= MAX_ROUTES_PER_KEY {
            routes.remove(0);
        }
        routes.push(PathCacheEntry {
            path: path.clone(),
            created: now,
        });
        path
    }

    /// All stored routes, including ones that have expired but not yet been
    /// pruned
    pub fn entries(&self) -> impl Iterator<Item = (&PathKey, &PathCacheEntry)> {
        self.entries
            .iter()
            .flat_map(|(key, routes)| routes.iter().map(move |entry| (key, entry)))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> PathCacheStats {
        self.stats
    }

    /// Drop every route; used when structures change the map
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
