//! Elevation allocation tables and the token arena.
//!
//! Each elevation has a base allocation and a multiplier. The effective
//! allocation is re-normalized so the total stays at the sum of the bases:
//!
//! `effective_e = base_e * mult_e * T / Σ(base_i * mult_i)`
//!
//! Emission uses an elevation's *committed* effective allocation, which only
//! moves when that elevation rolls over or has its own multiplier changed.

use cairn_ledger::{EmissionShare, TokenFees};
use cairn_types::{Elevation, EngineParams, TokenId, BPS_DENOMINATOR};
use cairn_utils::mul_div;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::RouterError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevationAllocation {
    pub base_allocation: u64,
    pub alloc_multiplier_bps: u64,
    pub committed_effective: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTable {
    elevations: [ElevationAllocation; Elevation::COUNT],
    max_multiplier_bps: u64,
}

impl AllocationTable {
    pub fn new(params: &EngineParams) -> Self {
        let elevations = params.elevation_base_alloc.map(|base| ElevationAllocation {
            base_allocation: base,
            alloc_multiplier_bps: BPS_DENOMINATOR,
            committed_effective: base as u128,
        });
        Self {
            elevations,
            max_multiplier_bps: params.max_alloc_multiplier_bps,
        }
    }

    pub fn get(&self, elevation: Elevation) -> &ElevationAllocation {
        &self.elevations[elevation.index()]
    }

    /// `T`: the total every re-normalization preserves.
    pub fn total_base(&self) -> u128 {
        self.elevations
            .iter()
            .map(|e| e.base_allocation as u128)
            .sum()
    }

    fn weighted_sum(&self) -> u128 {
        self.elevations
            .iter()
            .map(|e| e.base_allocation as u128 * e.alloc_multiplier_bps as u128)
            .sum()
    }

    /// Effective allocation under the current multipliers.
    pub fn normalized_effective(&self, elevation: Elevation) -> Result<u128, RouterError> {
        let e = self.get(elevation);
        let weighted = e.base_allocation as u128 * e.alloc_multiplier_bps as u128;
        Ok(mul_div(weighted, self.total_base(), self.weighted_sum())
            .map_err(cairn_ledger::LedgerError::from)?)
    }

    pub fn multiplier_bps(&self, elevation: Elevation) -> u64 {
        self.get(elevation).alloc_multiplier_bps
    }

    /// Change an elevation's multiplier and commit its new share at once.
    ///
    /// Other elevations keep their committed shares until their own rollover.
    pub fn set_multiplier(&mut self, elevation: Elevation, bps: u64) -> Result<(), RouterError> {
        if bps > self.max_multiplier_bps {
            return Err(RouterError::ParamTooHigh {
                name: "allocation multiplier",
                requested: bps,
                cap: self.max_multiplier_bps,
            });
        }
        self.elevations[elevation.index()].alloc_multiplier_bps = bps;
        self.refresh(elevation)
    }

    /// Commit the elevation's current normalized share (done at its rollover).
    pub fn refresh(&mut self, elevation: Elevation) -> Result<(), RouterError> {
        let effective = self.normalized_effective(elevation)?;
        self.elevations[elevation.index()].committed_effective = effective;
        Ok(())
    }

    /// Emission inputs for an elevation's pools.
    pub fn share(&self, elevation: Elevation, emission_per_second: u64) -> EmissionShare {
        EmissionShare {
            emission_per_second: emission_per_second as u128,
            elevation_alloc: self.get(elevation).committed_effective,
            total_elevation_alloc: self.total_base(),
        }
    }
}

/// A registered token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub token_alloc: u64,
    pub fees: TokenFees,
}

/// Arena of registered tokens, indexed by [`TokenId`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenRegistry {
    tokens: Vec<TokenConfig>,
    by_symbol: HashMap<String, TokenId>,
    collected_fees: Vec<u128>,
}

impl TokenRegistry {
    pub fn register(&mut self, config: TokenConfig) -> Result<TokenId, RouterError> {
        if self.by_symbol.contains_key(&config.symbol) {
            return Err(RouterError::Duplicated(config.symbol));
        }
        let id = TokenId::new(self.tokens.len() as u32);
        self.by_symbol.insert(config.symbol.clone(), id);
        self.tokens.push(config);
        self.collected_fees.push(0);
        Ok(id)
    }

    pub fn get(&self, token: TokenId) -> Result<&TokenConfig, RouterError> {
        self.tokens
            .get(token.index())
            .ok_or_else(|| RouterError::UnknownToken(token.to_string()))
    }

    pub fn get_mut(&mut self, token: TokenId) -> Result<&mut TokenConfig, RouterError> {
        self.tokens
            .get_mut(token.index())
            .ok_or_else(|| RouterError::UnknownToken(token.to_string()))
    }

    pub fn id(&self, symbol: &str) -> Option<TokenId> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn collect_fee(&mut self, token: TokenId, amount: u128) {
        if let Some(total) = self.collected_fees.get_mut(token.index()) {
            *total = total.saturating_add(amount);
        }
    }

    pub fn collected_fees(&self, token: TokenId) -> u128 {
        self.collected_fees.get(token.index()).copied().unwrap_or(0)
    }
}
