//! The per-elevation pool ledger.

use cairn_rounds::RoundView;
use cairn_types::{
    Address, Elevation, ElevationKind, EngineParams, PoolId, Timestamp, TokenId, Totem,
};
use cairn_utils::apply_bps;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::emission::EmissionShare;
use crate::error::LedgerError;
use crate::fairness::{FairnessBook, TokenFees};
use crate::pool::{Pool, RoundOutcome};
use crate::position::UserPoolPosition;

/// Ledger limits and lottery split settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    pub max_active_pools: usize,
    pub max_staked_pools_per_user: usize,
    pub totem_pot_bps: u64,
    pub loser_pot_keep_bps: u64,
    pub max_win_multiplier_bps: u64,
}

impl LedgerParams {
    pub fn from_params(params: &EngineParams) -> Self {
        Self {
            max_active_pools: params.max_active_pools,
            max_staked_pools_per_user: params.max_staked_pools_per_user,
            totem_pot_bps: params.totem_pot_bps,
            loser_pot_keep_bps: params.loser_pot_keep_bps,
            max_win_multiplier_bps: params.max_win_multiplier_bps,
        }
    }
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self::from_params(&EngineParams::default())
    }
}

/// Everything the ledger needs to know about "now" for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerContext {
    pub now: Timestamp,
    pub round: u64,
    pub unlocked: bool,
    pub in_lockout: bool,
    pub share: EmissionShare,
}

impl LedgerContext {
    pub fn new(view: &impl RoundView, now: Timestamp, share: EmissionShare) -> Self {
        Self {
            now,
            round: view.round_number(),
            unlocked: view.is_unlocked(now),
            in_lockout: view.in_lockout(now),
            share,
        }
    }

    /// Deposits need a running round.
    fn accepts_deposits(&self) -> bool {
        self.unlocked && self.round > 0
    }
}

/// A user's totem at this elevation and the round it was picked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotemSelection {
    pub totem: Totem,
    pub round: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    pub pool: PoolId,
    pub totem: Totem,
    /// Amount credited to the position.
    pub staked: u128,
    pub fee: u128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub pool: PoolId,
    pub amount: u128,
    pub tax: u128,
    /// `amount - tax`, paid back to the user.
    pub returned: u128,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub reward: u128,
    pub bonus: u128,
}

impl ClaimReceipt {
    pub fn total(&self) -> u128 {
        self.reward.saturating_add(self.bonus)
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            reward: self.reward.saturating_add(other.reward),
            bonus: self.bonus.saturating_add(other.bonus),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmergencyReceipt {
    pub pool: PoolId,
    pub returned: u128,
    pub forfeited: u128,
}

/// Pools, positions and totem selections of one elevation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolLedger {
    elevation: Elevation,
    kind: ElevationKind,
    params: LedgerParams,
    pools: BTreeMap<TokenId, Pool>,
    active: Vec<TokenId>,
    positions: HashMap<(Address, TokenId), UserPoolPosition>,
    interacting: HashMap<Address, BTreeSet<TokenId>>,
    selections: HashMap<Address, TotemSelection>,
}

impl PoolLedger {
    pub fn new(elevation: Elevation, params: LedgerParams) -> Self {
        Self {
            elevation,
            kind: elevation.kind(),
            params,
            pools: BTreeMap::new(),
            active: Vec::new(),
            positions: HashMap::new(),
            interacting: HashMap::new(),
            selections: HashMap::new(),
        }
    }

    pub fn elevation(&self) -> Elevation {
        self.elevation
    }

    pub fn kind(&self) -> ElevationKind {
        self.kind
    }

    pub fn params(&self) -> LedgerParams {
        self.params
    }

    fn pool_id(&self, token: TokenId) -> PoolId {
        PoolId::new(token, self.elevation)
    }

    // ── Pool registry ────────────────────────────────────────────────────

    /// Register a live pool and put it in the active set.
    pub fn add_pool(
        &mut self,
        ctx: &LedgerContext,
        token: TokenId,
        allocation_points: u128,
    ) -> Result<(), LedgerError> {
        let id = self.pool_id(token);
        if self.pools.contains_key(&token) {
            return Err(LedgerError::Duplicated(id));
        }
        if self.active.len() >= self.params.max_active_pools {
            return Err(LedgerError::TooManyActivePools {
                limit: self.params.max_active_pools,
            });
        }
        self.update_all(ctx)?;

        let mut pool = Pool::new(id, self.kind, allocation_points, ctx.round, ctx.now);
        pool.is_active = true;
        self.pools.insert(token, pool);
        self.active.push(token);
        tracing::info!(pool = %id, allocation_points, "pool added");
        Ok(())
    }

    /// Enable or disable deposits into a pool.
    ///
    /// A disabled pool keeps earning until its next rollover, then leaves the
    /// active set. Re-enabling puts it back immediately if there is room.
    pub fn set_pool_live(
        &mut self,
        ctx: &LedgerContext,
        token: TokenId,
        live: bool,
    ) -> Result<(), LedgerError> {
        let id = self.pool_id(token);
        let is_active = self
            .pools
            .get(&token)
            .map(|p| p.is_active)
            .ok_or(LedgerError::PoolNotFound(id))?;
        if live && !is_active && self.active.len() >= self.params.max_active_pools {
            return Err(LedgerError::TooManyActivePools {
                limit: self.params.max_active_pools,
            });
        }
        self.update_all(ctx)?;

        let pool = self
            .pools
            .get_mut(&token)
            .ok_or(LedgerError::PoolNotFound(id))?;
        pool.is_live = live;
        if live && !is_active {
            pool.advance_to_round(ctx.round)?;
            pool.last_reward_timestamp = ctx.now;
            pool.is_active = true;
            self.active.push(token);
        }
        tracing::info!(pool = %id, live, "pool liveness changed");
        Ok(())
    }

    /// Change a pool's allocation points, accruing everything at the old rate first.
    pub fn set_allocation(
        &mut self,
        ctx: &LedgerContext,
        token: TokenId,
        allocation_points: u128,
    ) -> Result<(), LedgerError> {
        let id = self.pool_id(token);
        if !self.pools.contains_key(&token) {
            return Err(LedgerError::PoolNotFound(id));
        }
        self.update_all(ctx)?;
        if let Some(pool) = self.pools.get_mut(&token) {
            pool.allocation_points = allocation_points;
        }
        Ok(())
    }

    /// Sum of the active pools' allocation points.
    pub fn total_token_alloc(&self) -> u128 {
        self.active
            .iter()
            .filter_map(|t| self.pools.get(t))
            .map(|p| p.allocation_points)
            .sum()
    }

    /// Accrue every active pool up to `ctx.now`.
    pub fn update_all(&mut self, ctx: &LedgerContext) -> Result<u128, LedgerError> {
        let total = self.total_token_alloc();
        let pot_bps = self.params.totem_pot_bps;
        let mut emitted = 0u128;
        for token in &self.active {
            if let Some(pool) = self.pools.get_mut(token) {
                emitted = emitted.saturating_add(pool.update(ctx.now, &ctx.share, total, pot_bps)?);
            }
        }
        Ok(emitted)
    }

    /// Update a single pool and bring it to the current round.
    fn touch(&mut self, ctx: &LedgerContext, token: TokenId) -> Result<&mut Pool, LedgerError> {
        let id = self.pool_id(token);
        let total = self.total_token_alloc();
        let pot_bps = self.params.totem_pot_bps;
        let pool = self
            .pools
            .get_mut(&token)
            .ok_or(LedgerError::PoolNotFound(id))?;
        pool.update(ctx.now, &ctx.share, total, pot_bps)?;
        pool.advance_to_round(ctx.round)?;
        Ok(pool)
    }

    /// A copy of the pool as [`PoolLedger::touch`] would leave it.
    fn preview(&self, ctx: &LedgerContext, token: TokenId) -> Result<Pool, LedgerError> {
        let mut pool = self
            .pools
            .get(&token)
            .cloned()
            .ok_or(LedgerError::PoolNotFound(self.pool_id(token)))?;
        pool.update(
            ctx.now,
            &ctx.share,
            self.total_token_alloc(),
            self.params.totem_pot_bps,
        )?;
        pool.advance_to_round(ctx.round)?;
        Ok(pool)
    }

    // ── Rounds ───────────────────────────────────────────────────────────

    /// Aggregate in-round pot per totem over the active pools.
    pub fn totem_weights(&self) -> [u128; Totem::COUNT] {
        let mut weights = [0u128; Totem::COUNT];
        for pool in self.active.iter().filter_map(|t| self.pools.get(t)) {
            for (w, p) in weights.iter_mut().zip(pool.round_pot_by_totem) {
                *w = w.saturating_add(p);
            }
        }
        weights
    }

    /// Close the current round of every active pool.
    ///
    /// Accrues up to `ctx.now` with the outgoing emission share first. Pools
    /// that were disabled during the round leave the active set afterwards.
    pub fn rollover_pools(
        &mut self,
        ctx: &LedgerContext,
        new_round: u64,
        winner: Option<Totem>,
    ) -> Result<Vec<RoundOutcome>, LedgerError> {
        self.update_all(ctx)?;
        let winner = match self.kind {
            ElevationKind::Lottery => winner,
            ElevationKind::Fixed => None,
        };

        let mut outcomes = Vec::with_capacity(self.active.len());
        for token in &self.active {
            if let Some(pool) = self.pools.get_mut(token) {
                let outcome = pool.finalize_round(
                    new_round,
                    winner,
                    self.params.loser_pot_keep_bps,
                    self.params.max_win_multiplier_bps,
                )?;
                outcomes.push(outcome.clone());
            }
        }

        let pools = &mut self.pools;
        self.active.retain(|token| match pools.get_mut(token) {
            Some(pool) if pool.is_live => true,
            Some(pool) => {
                pool.is_active = false;
                tracing::info!(pool = %pool.id, "disabled pool left the active set");
                false
            }
            None => false,
        });

        tracing::info!(
            elevation = %self.elevation,
            new_round,
            winner = ?winner,
            pools = outcomes.len(),
            "pools rolled over"
        );
        Ok(outcomes)
    }

    // ── Validation ───────────────────────────────────────────────────────

    /// Check a deposit without changing anything. Returns the totem the stake
    /// will land on.
    pub fn validate_deposit(
        &self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        amount: u128,
        totem: Option<Totem>,
    ) -> Result<Totem, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonZeroAmount);
        }
        let id = self.pool_id(token);
        let live = self.pools.get(&token).map(|p| p.is_live).unwrap_or(false);
        if !ctx.accepts_deposits() || !live {
            return Err(LedgerError::PoolNotAvailableYet(id));
        }
        if ctx.in_lockout {
            return Err(LedgerError::ElevationLockedUntilRollover(self.elevation));
        }
        let totem = self.resolve_totem(user, totem)?;

        let interacting = self.interacting.get(user);
        let already = interacting.is_some_and(|set| set.contains(&token));
        let count = interacting.map_or(0, |set| set.len());
        if !already && count >= self.params.max_staked_pools_per_user {
            return Err(LedgerError::TooManyStakedPools {
                limit: self.params.max_staked_pools_per_user,
            });
        }
        Ok(totem)
    }

    fn resolve_totem(&self, user: &Address, supplied: Option<Totem>) -> Result<Totem, LedgerError> {
        if self.kind == ElevationKind::Fixed {
            return match supplied {
                None | Some(Totem::ZERO) => Ok(Totem::ZERO),
                Some(_) => Err(LedgerError::InvalidTotem),
            };
        }
        match (self.selections.get(user), supplied) {
            (None, None) => Err(LedgerError::TotemMustBeSelected(self.elevation)),
            (None, Some(totem)) => Ok(totem),
            (Some(selection), None) => Ok(selection.totem),
            (Some(selection), Some(totem)) if selection.totem == totem => Ok(totem),
            (Some(_), Some(_)) => Err(LedgerError::NoTotemSwitch(self.elevation)),
        }
    }

    /// Check that `user` can take `amount` out of the pool.
    pub fn validate_withdraw(
        &self,
        user: &Address,
        token: TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonZeroAmount);
        }
        if !self.pools.contains_key(&token) {
            return Err(LedgerError::PoolNotFound(self.pool_id(token)));
        }
        let staked = self.user_staked(user, token);
        if amount > staked {
            return Err(LedgerError::BadWithdrawal {
                requested: amount,
                staked,
            });
        }
        Ok(())
    }

    // ── Stake movements ──────────────────────────────────────────────────

    /// Stake `amount` into a pool, charging the token's deposit fee.
    pub fn deposit(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        amount: u128,
        totem: Option<Totem>,
        fees: &TokenFees,
        book: &mut FairnessBook,
    ) -> Result<DepositReceipt, LedgerError> {
        let totem = self.validate_deposit(ctx, user, token, amount, totem)?;
        let fee = apply_bps(amount, fees.deposit_fee_bps)?;
        let net = amount.checked_sub(fee).ok_or(LedgerError::Overflow)?;
        let resets_tax = book.deposit_resets_tax(user, token, net, fees)?;

        self.credit(ctx, user, token, net, totem)?;
        book.record_deposit(user, token, net, resets_tax, ctx.now)?;

        tracing::debug!(
            %user,
            pool = %self.pool_id(token),
            amount,
            fee,
            %totem,
            resets_tax,
            "deposit"
        );
        Ok(DepositReceipt {
            pool: self.pool_id(token),
            totem,
            staked: net,
            fee,
        })
    }

    /// Take `amount` out of a pool, charging the fairness tax.
    pub fn withdraw(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        amount: u128,
        fees: &TokenFees,
        book: &mut FairnessBook,
    ) -> Result<WithdrawReceipt, LedgerError> {
        self.validate_withdraw(user, token, amount)?;
        let tax_bps = book.withdrawal_tax_bps(user, token, fees, ctx.now);
        let tax = apply_bps(amount, tax_bps)?;
        let returned = amount.checked_sub(tax).ok_or(LedgerError::Overflow)?;

        self.debit(ctx, user, token, amount)?;
        book.record_withdraw(user, token, amount, ctx.now);

        tracing::debug!(%user, pool = %self.pool_id(token), amount, tax_bps, tax, "withdraw");
        Ok(WithdrawReceipt {
            pool: self.pool_id(token),
            amount,
            tax,
            returned,
        })
    }

    /// Move stake in from another elevation: no fee, no timers.
    pub fn transfer_in(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        amount: u128,
        totem: Totem,
    ) -> Result<(), LedgerError> {
        self.credit(ctx, user, token, amount, totem)
    }

    /// Move stake out to another elevation: no tax, no timers.
    pub fn transfer_out(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.validate_withdraw(user, token, amount)?;
        self.debit(ctx, user, token, amount)
    }

    fn credit(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        amount: u128,
        totem: Totem,
    ) -> Result<(), LedgerError> {
        let key = (user.clone(), token);
        let existing = self.positions.get(&key).cloned();
        let pool = self.touch(ctx, token)?;
        let mut position = match existing {
            Some(mut position) => {
                position.settle(pool)?;
                position
            }
            None => UserPoolPosition::new(totem, pool),
        };
        position.staked = position
            .staked
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        pool.add_stake(totem, amount)?;

        self.positions.insert(key, position);
        self.interacting.entry(user.clone()).or_default().insert(token);
        if self.kind == ElevationKind::Lottery {
            self.selections.entry(user.clone()).or_insert(TotemSelection {
                totem,
                round: ctx.round,
            });
        }
        Ok(())
    }

    fn debit(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let key = (user.clone(), token);
        let mut position = self.positions.get(&key).cloned().unwrap_or_default();
        let pool = self.touch(ctx, token)?;
        position.settle(pool)?;
        position.staked -= amount;
        pool.remove_stake(position.totem, amount);
        self.store_position(user, token, position);
        Ok(())
    }

    /// Keep a position, or drop it from the maps once it is empty.
    fn store_position(&mut self, user: &Address, token: TokenId, position: UserPoolPosition) {
        let key = (user.clone(), token);
        if position.is_empty() {
            self.positions.remove(&key);
            if let Some(set) = self.interacting.get_mut(user) {
                set.remove(&token);
                if set.is_empty() {
                    self.interacting.remove(user);
                }
            }
        } else {
            self.positions.insert(key, position);
        }
    }

    // ── Claims ───────────────────────────────────────────────────────────

    /// Pay out vested rewards from one pool plus the staking bonus.
    pub fn claim(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        book: &FairnessBook,
    ) -> Result<ClaimReceipt, LedgerError> {
        let key = (user.clone(), token);
        let Some(mut position) = self.positions.get(&key).cloned() else {
            if self.pools.contains_key(&token) {
                return Ok(ClaimReceipt::default());
            }
            return Err(LedgerError::PoolNotFound(self.pool_id(token)));
        };
        let pool = self.touch(ctx, token)?;
        position.settle(pool)?;

        let reward = std::mem::take(&mut position.vested);
        let bonus_bps = book.staking_bonus_bps(user, token, ctx.now);
        let bonus = apply_bps(reward, bonus_bps)?;
        self.store_position(user, token, position);

        if reward > 0 {
            tracing::debug!(%user, pool = %self.pool_id(token), reward, bonus, "claim");
        }
        Ok(ClaimReceipt { reward, bonus })
    }

    /// Claim every pool the user interacts with at this elevation.
    pub fn claim_elevation(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        book: &FairnessBook,
    ) -> Result<Vec<(TokenId, ClaimReceipt)>, LedgerError> {
        let tokens = self.interacting_pools(user);
        // Settle against previews first so a failure leaves nothing half-claimed.
        for token in &tokens {
            self.claimable_rewards(ctx, user, *token)?;
        }
        let mut receipts = Vec::with_capacity(tokens.len());
        for token in tokens {
            receipts.push((token, self.claim(ctx, user, token, book)?));
        }
        Ok(receipts)
    }

    /// What `claim` would pay at `ctx`, leaving the ledger untouched.
    pub fn preview_claim(
        &self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        book: &FairnessBook,
    ) -> Result<ClaimReceipt, LedgerError> {
        if !self.pools.contains_key(&token) {
            return Err(LedgerError::PoolNotFound(self.pool_id(token)));
        }
        let reward = self.claimable_rewards(ctx, user, token)?;
        let bonus = apply_bps(reward, book.staking_bonus_bps(user, token, ctx.now))?;
        Ok(ClaimReceipt { reward, bonus })
    }

    /// What `claim_elevation` would pay at `ctx`, summed over pools.
    pub fn preview_claim_elevation(
        &self,
        ctx: &LedgerContext,
        user: &Address,
        book: &FairnessBook,
    ) -> Result<ClaimReceipt, LedgerError> {
        self.interacting_pools(user)
            .into_iter()
            .try_fold(ClaimReceipt::default(), |acc, token| {
                Ok(acc.merge(self.preview_claim(ctx, user, token, book)?))
            })
    }

    // ── Totems ───────────────────────────────────────────────────────────

    /// Move every position of `user` at this elevation to `totem`.
    ///
    /// Stake and the pot carried in the running round follow the user.
    pub fn switch_totem(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        totem: Totem,
    ) -> Result<(), LedgerError> {
        if self.kind == ElevationKind::Fixed {
            return Err(LedgerError::InvalidTotem);
        }
        if ctx.in_lockout {
            return Err(LedgerError::ElevationLockedUntilRollover(self.elevation));
        }
        let previous = self.selections.get(user).map(|s| s.totem);
        if previous == Some(totem) {
            return Ok(());
        }

        let tokens = self.interacting_pools(user);
        let mut settled = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let pool = self.preview(ctx, *token)?;
            let position = self
                .positions
                .get(&(user.clone(), *token))
                .cloned()
                .unwrap_or_default()
                .settled(&pool)?;
            settled.push((*token, position));
        }

        for (token, mut position) in settled {
            let pool = self.touch(ctx, token)?;
            let from = position.totem;
            pool.remove_stake(from, position.staked);
            pool.add_stake(totem, position.staked)?;
            pool.move_round_pot(from, totem, position.round_pot_accrued);
            position.totem = totem;
            self.positions.insert((user.clone(), token), position);
        }
        self.selections.insert(
            user.clone(),
            TotemSelection {
                totem,
                round: ctx.round,
            },
        );
        tracing::debug!(
            %user,
            elevation = %self.elevation,
            from = ?previous,
            to = %totem,
            "totem switched"
        );
        Ok(())
    }

    // ── Emergency ────────────────────────────────────────────────────────

    /// Return the full stake without tax, forfeiting every unclaimed reward.
    pub fn emergency_withdraw(
        &mut self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
        book: &mut FairnessBook,
    ) -> Result<EmergencyReceipt, LedgerError> {
        let id = self.pool_id(token);
        let key = (user.clone(), token);
        let Some(mut position) = self.positions.get(&key).cloned() else {
            return Ok(EmergencyReceipt {
                pool: id,
                returned: 0,
                forfeited: 0,
            });
        };
        let total = self.total_token_alloc();
        let pot_bps = self.params.totem_pot_bps;
        let pool = self
            .pools
            .get_mut(&token)
            .ok_or(LedgerError::PoolNotFound(id))?;
        if let Err(err) = catch_up(pool, &mut position, ctx, total, pot_bps) {
            tracing::warn!(%user, pool = %id, %err, "emergency withdraw without settlement");
        }

        if position.round == pool.round {
            pool.forfeit_round_pot(position.totem, position.round_pot_accrued);
        }
        let forfeited = position.vested.saturating_add(position.round_pot_accrued);
        pool.forfeited = pool.forfeited.saturating_add(forfeited);
        pool.remove_stake(position.totem, position.staked);
        let returned = position.staked;

        self.positions.remove(&key);
        if let Some(set) = self.interacting.get_mut(user) {
            set.remove(&token);
            if set.is_empty() {
                self.interacting.remove(user);
            }
        }
        book.record_withdraw(user, token, returned, ctx.now);

        tracing::warn!(%user, pool = %id, returned, forfeited, "emergency withdraw");
        Ok(EmergencyReceipt {
            pool: id,
            returned,
            forfeited,
        })
    }

    // ── Views ────────────────────────────────────────────────────────────

    /// Rewards the user could claim right now (before the staking bonus).
    pub fn claimable_rewards(
        &self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
    ) -> Result<u128, LedgerError> {
        Ok(self.settled_position(ctx, user, token)?.map_or(0, |p| p.vested))
    }

    /// Pot earned in the running round, paid out after its draw.
    pub fn pending_round_rewards(
        &self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
    ) -> Result<u128, LedgerError> {
        Ok(self
            .settled_position(ctx, user, token)?
            .map_or(0, |p| p.round_pot_accrued))
    }

    fn settled_position(
        &self,
        ctx: &LedgerContext,
        user: &Address,
        token: TokenId,
    ) -> Result<Option<UserPoolPosition>, LedgerError> {
        match self.positions.get(&(user.clone(), token)) {
            Some(position) => {
                let pool = self.preview(ctx, token)?;
                Ok(Some(position.settled(&pool)?))
            }
            None => Ok(None),
        }
    }

    pub fn user_staked(&self, user: &Address, token: TokenId) -> u128 {
        self.positions
            .get(&(user.clone(), token))
            .map_or(0, |p| p.staked)
    }

    /// Stake across every pool of this elevation.
    pub fn user_total_staked(&self, user: &Address) -> u128 {
        self.interacting_pools(user)
            .into_iter()
            .map(|t| self.user_staked(user, t))
            .fold(0u128, u128::saturating_add)
    }

    /// Claimable rewards across every pool of this elevation.
    pub fn user_total_claimable(
        &self,
        ctx: &LedgerContext,
        user: &Address,
    ) -> Result<u128, LedgerError> {
        self.interacting_pools(user)
            .into_iter()
            .try_fold(0u128, |acc, t| {
                Ok(acc.saturating_add(self.claimable_rewards(ctx, user, t)?))
            })
    }

    pub fn interacting_pools(&self, user: &Address) -> Vec<TokenId> {
        self.interacting
            .get(user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn active_pools(&self) -> &[TokenId] {
        &self.active
    }

    pub fn pool(&self, token: TokenId) -> Option<&Pool> {
        self.pools.get(&token)
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn position(&self, user: &Address, token: TokenId) -> Option<&UserPoolPosition> {
        self.positions.get(&(user.clone(), token))
    }

    pub fn selected_totem(&self, user: &Address) -> Option<TotemSelection> {
        self.selections.get(user).copied()
    }
}

fn catch_up(
    pool: &mut Pool,
    position: &mut UserPoolPosition,
    ctx: &LedgerContext,
    total_token_alloc: u128,
    pot_bps: u64,
) -> Result<(), LedgerError> {
    pool.update(ctx.now, &ctx.share, total_token_alloc, pot_bps)?;
    pool.advance_to_round(ctx.round)?;
    position.settle(pool)
}
