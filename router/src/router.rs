//! The router: every public entry point of the engine.

use serde::{Deserialize, Serialize};

use cairn_collaborators::{
    ClaimTarget, EpochVestingLedger, EverestLedger, EverestLocks, StakeView, WinningsVesting,
};
use cairn_ledger::{
    ClaimReceipt, DepositReceipt, EmergencyReceipt, FairnessBook, FairnessParams, LedgerContext,
    LedgerError, LedgerParams, Pool, PoolLedger, TokenFees, UserPoolPosition, WithdrawReceipt,
};
use cairn_randomness::{DrawPolicy, RandomnessCoordinator};
use cairn_rounds::{ElevationStatus, Round, RoundScheduler};
use cairn_types::{
    Address, BlockContext, Elevation, ElevationKind, EngineParams, Hash32, PoolId, Timestamp,
    TokenId, Totem, BPS_DENOMINATOR,
};

use crate::allocation::{AllocationTable, TokenConfig, TokenRegistry};
use crate::config::EngineConfig;
use crate::RouterError;

/// What a rollover did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RolloverReport {
    pub elevation: Elevation,
    pub closed_round: u64,
    pub new_round: u64,
    pub winner: Option<Totem>,
    pub seed: Option<Hash32>,
    pub weights: [u128; Totem::COUNT],
    pub pools: usize,
    /// Pot moved from losers to winners across all pools.
    pub transferred: u128,
}

/// Engine state that survives a snapshot. Collaborators are not included.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct EngineState {
    params: EngineParams,
    owner: Address,
    address: Address,
    paused: bool,
    tokens: TokenRegistry,
    allocations: AllocationTable,
    ledgers: [PoolLedger; Elevation::COUNT],
    scheduler: RoundScheduler,
    randomness: RandomnessCoordinator,
    draw: DrawPolicy,
    fairness: FairnessBook,
}

/// Entry point of the engine.
///
/// Owns the four elevation ledgers, the round scheduler, the randomness
/// coordinator, the token arena and the allocation tables. Every call
/// validates before it mutates, so a failed call leaves no trace.
pub struct Router<V = EpochVestingLedger, E = EverestLedger> {
    state: EngineState,
    vesting: V,
    everest: E,
}

impl Router<EpochVestingLedger, EverestLedger> {
    /// Build an engine with the in-memory reference collaborators.
    pub fn from_config(config: &EngineConfig, launch: Timestamp) -> Result<Self, RouterError> {
        let vesting = EpochVestingLedger::new(
            config.router_address(),
            config.expedition_address(),
            config.vesting_epoch_secs,
        );
        Self::new(config, launch, vesting, EverestLedger::new())
    }
}

impl<V: WinningsVesting, E: EverestLocks> Router<V, E> {
    pub fn new(
        config: &EngineConfig,
        launch: Timestamp,
        vesting: V,
        everest: E,
    ) -> Result<Self, RouterError> {
        config.validate()?;
        let params = config.params.clone();
        let ledger_params = LedgerParams::from_params(&params);
        let state = EngineState {
            owner: config.owner(),
            address: config.router_address(),
            paused: false,
            tokens: TokenRegistry::default(),
            allocations: AllocationTable::new(&params),
            ledgers: Elevation::ALL.map(|e| PoolLedger::new(e, ledger_params)),
            scheduler: RoundScheduler::new(&params, launch)?,
            randomness: RandomnessCoordinator::new(
                config.trusted_seeder(),
                params.seal_window_secs,
            ),
            draw: DrawPolicy::from_params(&params),
            fairness: FairnessBook::new(FairnessParams::from_params(&params)),
            params,
        };
        tracing::info!(
            owner = %state.owner,
            launch = %launch,
            "engine created"
        );
        Ok(Self {
            state,
            vesting,
            everest,
        })
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn ensure_owner(&self, caller: &Address) -> Result<(), RouterError> {
        if *caller != self.state.owner {
            return Err(RouterError::NonOwner(caller.clone()));
        }
        Ok(())
    }

    fn ensure_not_paused(&self) -> Result<(), RouterError> {
        if self.state.paused {
            return Err(RouterError::Paused);
        }
        Ok(())
    }

    fn ledger_ctx(&self, elevation: Elevation, now: Timestamp) -> LedgerContext {
        LedgerContext::new(
            self.state.scheduler.schedule(elevation),
            now,
            self.state
                .allocations
                .share(elevation, self.state.params.emission_per_second),
        )
    }

    fn ledger(&self, elevation: Elevation) -> &PoolLedger {
        &self.state.ledgers[elevation.index()]
    }

    fn fees(&self, token: TokenId) -> Result<TokenFees, RouterError> {
        Ok(self.state.tokens.get(token)?.fees)
    }

    fn parse_totem(raw: Option<u8>) -> Result<Option<Totem>, RouterError> {
        raw.map(|t| Totem::new(t).map_err(|_| LedgerError::InvalidTotem))
            .transpose()
            .map_err(RouterError::from)
    }

    /// Hand a claim to its collaborator.
    fn route_claim(
        &mut self,
        user: &Address,
        receipt: ClaimReceipt,
        target: ClaimTarget,
        now: Timestamp,
    ) -> Result<(), RouterError> {
        if receipt.total() == 0 {
            return Ok(());
        }
        match target {
            ClaimTarget::Vesting => self.vesting.add_locked_winnings(
                &self.state.address,
                receipt.reward,
                receipt.bonus,
                user,
                now,
            )?,
            ClaimTarget::Everest => self.everest.add_locked_winnings(user, receipt.total())?,
        }
        Ok(())
    }

    /// Fail if the collaborator would refuse `preview`. Runs before the
    /// ledger zeroes anything.
    fn check_claim(
        &self,
        user: &Address,
        preview: ClaimReceipt,
        target: ClaimTarget,
        now: Timestamp,
    ) -> Result<(), RouterError> {
        let router = &self.state.address;
        match target {
            ClaimTarget::Vesting => {
                self.vesting.authorize(router)?;
                if preview.total() > 0 {
                    self.vesting.check_locked_winnings(
                        router,
                        preview.reward,
                        preview.bonus,
                        user,
                        now,
                    )?;
                }
            }
            ClaimTarget::Everest if preview.total() > 0 => {
                self.everest.check_locked_winnings(user, preview.total())?;
            }
            ClaimTarget::Everest => {}
        }
        Ok(())
    }

    // ── Admin ────────────────────────────────────────────────────────────

    pub fn register_token(
        &mut self,
        caller: &Address,
        symbol: &str,
        token_alloc: u64,
        is_native: bool,
    ) -> Result<TokenId, RouterError> {
        self.ensure_owner(caller)?;
        let config = TokenConfig {
            symbol: symbol.to_string(),
            token_alloc,
            fees: TokenFees::from_params(&self.state.params, is_native),
        };
        let id = self.state.tokens.register(config)?;
        tracing::info!(%symbol, token = %id, token_alloc, is_native, "token registered");
        Ok(id)
    }

    /// Open a pool for `token` at `elevation`.
    pub fn add_pool(
        &mut self,
        caller: &Address,
        ctx: &BlockContext,
        token: TokenId,
        elevation: Elevation,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        let alloc = self.state.tokens.get(token)?.token_alloc as u128;
        let lctx = self.ledger_ctx(elevation, ctx.now());
        self.state.ledgers[elevation.index()].add_pool(&lctx, token, alloc)?;
        Ok(())
    }

    pub fn set_pool_live(
        &mut self,
        caller: &Address,
        ctx: &BlockContext,
        pool: PoolId,
        live: bool,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        let lctx = self.ledger_ctx(pool.elevation, ctx.now());
        self.state.ledgers[pool.elevation.index()].set_pool_live(&lctx, pool.token, live)?;
        Ok(())
    }

    /// Change a token's weight in every elevation it is staked at.
    pub fn set_token_alloc(
        &mut self,
        caller: &Address,
        ctx: &BlockContext,
        token: TokenId,
        token_alloc: u64,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        self.state.tokens.get(token)?;
        for elevation in Elevation::ALL {
            if self.ledger(elevation).pool(token).is_none() {
                continue;
            }
            let lctx = self.ledger_ctx(elevation, ctx.now());
            self.state.ledgers[elevation.index()].set_allocation(
                &lctx,
                token,
                token_alloc as u128,
            )?;
        }
        self.state.tokens.get_mut(token)?.token_alloc = token_alloc;
        tracing::info!(%token, token_alloc, "token allocation updated");
        Ok(())
    }

    pub fn set_elevation_multiplier(
        &mut self,
        caller: &Address,
        ctx: &BlockContext,
        elevation: Elevation,
        multiplier_bps: u64,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        let mut allocations = self.state.allocations.clone();
        allocations.set_multiplier(elevation, multiplier_bps)?;

        // Accrue at the old share before the new one takes effect.
        let lctx = self.ledger_ctx(elevation, ctx.now());
        self.state.ledgers[elevation.index()].update_all(&lctx)?;
        self.state.allocations = allocations;
        tracing::info!(
            %elevation,
            multiplier_bps,
            committed = self.state.allocations.get(elevation).committed_effective,
            "elevation multiplier updated"
        );
        Ok(())
    }

    pub fn set_round_duration_multiplier(
        &mut self,
        caller: &Address,
        elevation: Elevation,
        mult: u64,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        self.state
            .scheduler
            .set_round_duration_multiplier(elevation, mult)?;
        self.state.params.round_duration_mult[elevation.index()] = mult;
        Ok(())
    }

    pub fn set_emission_per_second(
        &mut self,
        caller: &Address,
        ctx: &BlockContext,
        emission_per_second: u64,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        for elevation in Elevation::ALL {
            let lctx = self.ledger_ctx(elevation, ctx.now());
            self.state.ledgers[elevation.index()].update_all(&lctx)?;
        }
        self.state.params.emission_per_second = emission_per_second;
        tracing::info!(emission_per_second, "emission rate updated");
        Ok(())
    }

    pub fn set_token_fees(
        &mut self,
        caller: &Address,
        token: TokenId,
        deposit_fee_bps: u64,
        max_withdraw_tax_bps: u64,
        min_withdraw_tax_bps: u64,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        let p = &self.state.params;
        if deposit_fee_bps > p.max_deposit_fee_bps {
            return Err(RouterError::ParamTooHigh {
                name: "deposit fee",
                requested: deposit_fee_bps,
                cap: p.max_deposit_fee_bps,
            });
        }
        if max_withdraw_tax_bps > p.max_withdraw_tax_cap_bps {
            return Err(RouterError::ParamTooHigh {
                name: "withdraw tax",
                requested: max_withdraw_tax_bps,
                cap: p.max_withdraw_tax_cap_bps,
            });
        }
        if min_withdraw_tax_bps > max_withdraw_tax_bps {
            return Err(RouterError::ParamTooHigh {
                name: "minimum withdraw tax",
                requested: min_withdraw_tax_bps,
                cap: max_withdraw_tax_bps,
            });
        }
        let fees = &mut self.state.tokens.get_mut(token)?.fees;
        fees.deposit_fee_bps = deposit_fee_bps;
        fees.max_withdraw_tax_bps = max_withdraw_tax_bps;
        fees.min_withdraw_tax_bps = min_withdraw_tax_bps;
        tracing::info!(
            %token,
            deposit_fee_bps,
            max_withdraw_tax_bps,
            min_withdraw_tax_bps,
            "token fees updated"
        );
        Ok(())
    }

    /// Tax decay window, bonus cap and bonus accrual window. Taxes and
    /// bonuses are computed when charged, so nothing needs accruing first.
    pub fn set_fairness_params(
        &mut self,
        caller: &Address,
        tax_decay_secs: u64,
        max_bonus_bps: u64,
        bonus_accrual_secs: u64,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        if max_bonus_bps > BPS_DENOMINATOR {
            return Err(RouterError::ParamTooHigh {
                name: "staking bonus",
                requested: max_bonus_bps,
                cap: BPS_DENOMINATOR,
            });
        }
        self.state.fairness.set_params(FairnessParams {
            tax_decay_secs,
            max_bonus_bps,
            bonus_accrual_secs,
        });
        let p = &mut self.state.params;
        p.tax_decay_secs = tax_decay_secs;
        p.max_bonus_bps = max_bonus_bps;
        p.bonus_accrual_secs = bonus_accrual_secs;
        tracing::info!(
            tax_decay_secs,
            max_bonus_bps,
            bonus_accrual_secs,
            "fairness parameters updated"
        );
        Ok(())
    }

    /// The seal window must stay inside the lockout.
    pub fn set_lockout_secs(&mut self, caller: &Address, secs: u64) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        if secs < self.state.params.seal_window_secs {
            return Err(RouterError::Config(format!(
                "lockout of {secs}s is shorter than the seal window"
            )));
        }
        self.state.scheduler.set_lockout_secs(secs);
        self.state.params.lockout_secs = secs;
        Ok(())
    }

    pub fn set_seal_window(&mut self, caller: &Address, secs: u64) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        if secs > self.state.params.lockout_secs {
            return Err(RouterError::Config(format!(
                "seal window of {secs}s exceeds the lockout"
            )));
        }
        self.state.randomness.set_seal_window(secs);
        self.state.params.seal_window_secs = secs;
        Ok(())
    }

    pub fn set_trusted_seeder(
        &mut self,
        caller: &Address,
        seeder: Address,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        self.state.randomness.set_trusted_seeder(seeder);
        Ok(())
    }

    pub fn set_paused(&mut self, caller: &Address, paused: bool) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        self.state.paused = paused;
        tracing::info!(paused, "pause flag updated");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), RouterError> {
        self.ensure_owner(caller)?;
        tracing::info!(from = %self.state.owner, to = %new_owner, "ownership transferred");
        self.state.owner = new_owner;
        Ok(())
    }

    // ── Staking ──────────────────────────────────────────────────────────

    pub fn deposit(
        &mut self,
        user: &Address,
        ctx: &BlockContext,
        pool: PoolId,
        amount: u128,
        totem: Option<u8>,
    ) -> Result<DepositReceipt, RouterError> {
        self.ensure_not_paused()?;
        let totem = Self::parse_totem(totem)?;
        let fees = self.fees(pool.token)?;
        let lctx = self.ledger_ctx(pool.elevation, ctx.now());

        let state = &mut self.state;
        let receipt = state.ledgers[pool.elevation.index()].deposit(
            &lctx,
            user,
            pool.token,
            amount,
            totem,
            &fees,
            &mut state.fairness,
        )?;
        state.tokens.collect_fee(pool.token, receipt.fee);
        Ok(receipt)
    }

    pub fn withdraw(
        &mut self,
        user: &Address,
        ctx: &BlockContext,
        pool: PoolId,
        amount: u128,
    ) -> Result<WithdrawReceipt, RouterError> {
        self.ensure_not_paused()?;
        let fees = self.fees(pool.token)?;
        let lctx = self.ledger_ctx(pool.elevation, ctx.now());

        let state = &mut self.state;
        let receipt = state.ledgers[pool.elevation.index()].withdraw(
            &lctx,
            user,
            pool.token,
            amount,
            &fees,
            &mut state.fairness,
        )?;
        state.tokens.collect_fee(pool.token, receipt.tax);
        Ok(receipt)
    }

    /// Move stake between elevations of the same token. No tax is charged
    /// and neither the tax nor the bonus timer moves.
    pub fn elevate(
        &mut self,
        user: &Address,
        ctx: &BlockContext,
        source: PoolId,
        target: PoolId,
        amount: u128,
        totem: Option<u8>,
    ) -> Result<(), RouterError> {
        self.ensure_not_paused()?;
        if source.elevation == target.elevation {
            return Err(RouterError::NoSameElevTransfer);
        }
        if source.token != target.token {
            return Err(RouterError::DifferentToken);
        }
        let totem = Self::parse_totem(totem)?;
        let now = ctx.now();
        let source_ctx = self.ledger_ctx(source.elevation, now);
        let target_ctx = self.ledger_ctx(target.elevation, now);

        let target_ledger = self.ledger(target.elevation);
        let resolved =
            target_ledger.validate_deposit(&target_ctx, user, target.token, amount, totem)?;
        let source_ledger = self.ledger(source.elevation);
        source_ledger.validate_withdraw(user, source.token, amount)?;
        if source_ctx.in_lockout {
            return Err(LedgerError::ElevationLockedUntilRollover(source.elevation).into());
        }

        self.state.ledgers[source.elevation.index()].transfer_out(
            &source_ctx,
            user,
            source.token,
            amount,
        )?;
        self.state.ledgers[target.elevation.index()].transfer_in(
            &target_ctx,
            user,
            target.token,
            amount,
            resolved,
        )?;
        tracing::debug!(%user, from = %source, to = %target, amount, "elevated");
        Ok(())
    }

    pub fn switch_totem(
        &mut self,
        user: &Address,
        ctx: &BlockContext,
        elevation: Elevation,
        totem: u8,
    ) -> Result<(), RouterError> {
        self.ensure_not_paused()?;
        let totem = Totem::new(totem).map_err(|_| LedgerError::InvalidTotem)?;
        let lctx = self.ledger_ctx(elevation, ctx.now());
        self.state.ledgers[elevation.index()].switch_totem(&lctx, user, totem)?;
        Ok(())
    }

    /// Take the whole stake out without tax, giving up every unclaimed
    /// reward. Works while paused.
    pub fn emergency_withdraw(
        &mut self,
        user: &Address,
        ctx: &BlockContext,
        pool: PoolId,
    ) -> Result<EmergencyReceipt, RouterError> {
        let lctx = self.ledger_ctx(pool.elevation, ctx.now());
        let state = &mut self.state;
        Ok(state.ledgers[pool.elevation.index()].emergency_withdraw(
            &lctx,
            user,
            pool.token,
            &mut state.fairness,
        )?)
    }

    // ── Claims ───────────────────────────────────────────────────────────

    pub fn claim_single_farm(
        &mut self,
        user: &Address,
        ctx: &BlockContext,
        pool: PoolId,
        target: ClaimTarget,
    ) -> Result<ClaimReceipt, RouterError> {
        self.ensure_not_paused()?;
        let lctx = self.ledger_ctx(pool.elevation, ctx.now());
        let preview = self
            .ledger(pool.elevation)
            .preview_claim(&lctx, user, pool.token, &self.state.fairness)?;
        self.check_claim(user, preview, target, ctx.now())?;

        let state = &mut self.state;
        let receipt = state.ledgers[pool.elevation.index()].claim(
            &lctx,
            user,
            pool.token,
            &state.fairness,
        )?;
        self.route_claim(user, receipt, target, ctx.now())?;
        Ok(receipt)
    }

    /// Claim every pool the user has at `elevation`.
    pub fn claim_elevation(
        &mut self,
        user: &Address,
        ctx: &BlockContext,
        elevation: Elevation,
        target: ClaimTarget,
    ) -> Result<ClaimReceipt, RouterError> {
        self.ensure_not_paused()?;
        let lctx = self.ledger_ctx(elevation, ctx.now());
        let preview = self
            .ledger(elevation)
            .preview_claim_elevation(&lctx, user, &self.state.fairness)?;
        self.check_claim(user, preview, target, ctx.now())?;

        let state = &mut self.state;
        let receipts =
            state.ledgers[elevation.index()].claim_elevation(&lctx, user, &state.fairness)?;
        let total = receipts
            .iter()
            .fold(ClaimReceipt::default(), |acc, (_, r)| acc.merge(*r));
        self.route_claim(user, total, target, ctx.now())?;
        Ok(total)
    }

    // ── Seeds & rounds ───────────────────────────────────────────────────

    pub fn submit_sealed_seed(
        &mut self,
        caller: &Address,
        ctx: &BlockContext,
        elevation: Elevation,
        sealed_hash: Hash32,
    ) -> Result<(), RouterError> {
        self.ensure_not_paused()?;
        let round = self.state.scheduler.current_round(elevation);
        if elevation.kind() == ElevationKind::Fixed || round.number == 0 {
            return Err(cairn_randomness::RandomnessError::SeedRoundNotAvailable(elevation).into());
        }
        let (number, end) = (round.number, round.end);
        self.state
            .randomness
            .submit_sealed_seed(caller, elevation, number, end, sealed_hash, ctx)?;
        Ok(())
    }

    pub fn submit_unsealed_seed(
        &mut self,
        caller: &Address,
        ctx: &BlockContext,
        elevation: Elevation,
        value: Hash32,
    ) -> Result<Hash32, RouterError> {
        self.ensure_not_paused()?;
        Ok(self
            .state
            .randomness
            .submit_unsealed_seed(caller, elevation, value, ctx)?)
    }

    /// Close the ended round of `elevation` and start the next one.
    pub fn rollover(
        &mut self,
        ctx: &BlockContext,
        elevation: Elevation,
    ) -> Result<RolloverReport, RouterError> {
        self.ensure_not_paused()?;
        let now = ctx.now();
        self.state.scheduler.check_rollover(elevation, now)?;
        let closed_round = self.state.scheduler.round_number(elevation);
        let draws = elevation.kind() == ElevationKind::Lottery && closed_round > 0;
        if draws {
            self.state.randomness.check_seed_ready(elevation)?;
        }

        // Accrue the whole ended round at the share committed for it.
        let lctx = self.ledger_ctx(elevation, now);
        let i = elevation.index();
        self.state.ledgers[i].update_all(&lctx)?;
        let weights = self.state.ledgers[i].totem_weights();

        let outcome = if draws {
            let seed = self.state.randomness.take_seed(elevation, closed_round, ctx)?;
            Some((self.state.draw.draw(&seed, weights), seed))
        } else {
            None
        };
        let winner = outcome.map(|(totem, _)| totem);

        let new_round = closed_round + 1;
        let outcomes = self.state.ledgers[i].rollover_pools(&lctx, new_round, winner)?;
        self.state.allocations.refresh(elevation)?;
        self.state.scheduler.begin_round(elevation, now, outcome)?;

        let report = RolloverReport {
            elevation,
            closed_round,
            new_round,
            winner,
            seed: outcome.map(|(_, seed)| seed),
            weights,
            pools: outcomes.len(),
            transferred: outcomes
                .iter()
                .fold(0u128, |acc, o| acc.saturating_add(o.transferred)),
        };
        tracing::info!(
            %elevation,
            closed_round,
            new_round,
            winner = ?report.winner,
            weight0 = weights[0],
            weight1 = weights[1],
            pools = report.pools,
            transferred = report.transferred,
            "rollover complete"
        );
        Ok(report)
    }

    // ── Snapshots ────────────────────────────────────────────────────────

    /// Serialize the engine state (collaborators excluded).
    pub fn save_snapshot(&self) -> Result<Vec<u8>, RouterError> {
        bincode::serialize(&self.state).map_err(|e| RouterError::Snapshot(e.to_string()))
    }

    /// Rebuild an engine from [`Router::save_snapshot`] output.
    pub fn load_snapshot(bytes: &[u8], vesting: V, everest: E) -> Result<Self, RouterError> {
        let state: EngineState =
            bincode::deserialize(bytes).map_err(|e| RouterError::Snapshot(e.to_string()))?;
        Ok(Self {
            state,
            vesting,
            everest,
        })
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn owner(&self) -> &Address {
        &self.state.owner
    }

    pub fn address(&self) -> &Address {
        &self.state.address
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn params(&self) -> &EngineParams {
        &self.state.params
    }

    pub fn vesting(&self) -> &V {
        &self.vesting
    }

    pub fn vesting_mut(&mut self) -> &mut V {
        &mut self.vesting
    }

    pub fn everest(&self) -> &E {
        &self.everest
    }

    pub fn pool_ledger(&self, elevation: Elevation) -> &PoolLedger {
        self.ledger(elevation)
    }

    pub fn scheduler(&self) -> &RoundScheduler {
        &self.state.scheduler
    }

    pub fn randomness(&self) -> &RandomnessCoordinator {
        &self.state.randomness
    }

    pub fn token(&self, token: TokenId) -> Result<&TokenConfig, RouterError> {
        self.state.tokens.get(token)
    }

    pub fn token_id(&self, symbol: &str) -> Option<TokenId> {
        self.state.tokens.id(symbol)
    }

    pub fn collected_fees(&self, token: TokenId) -> u128 {
        self.state.tokens.collected_fees(token)
    }

    pub fn pool(&self, pool: PoolId) -> Option<&Pool> {
        self.ledger(pool.elevation).pool(pool.token)
    }

    pub fn claimable_rewards(
        &self,
        user: &Address,
        pool: PoolId,
        now: Timestamp,
    ) -> Result<u128, RouterError> {
        let lctx = self.ledger_ctx(pool.elevation, now);
        Ok(self
            .ledger(pool.elevation)
            .claimable_rewards(&lctx, user, pool.token)?)
    }

    pub fn pending_round_rewards(
        &self,
        user: &Address,
        pool: PoolId,
        now: Timestamp,
    ) -> Result<u128, RouterError> {
        let lctx = self.ledger_ctx(pool.elevation, now);
        Ok(self
            .ledger(pool.elevation)
            .pending_round_rewards(&lctx, user, pool.token)?)
    }

    pub fn position(&self, user: &Address, pool: PoolId) -> Option<&UserPoolPosition> {
        self.ledger(pool.elevation).position(user, pool.token)
    }

    pub fn staked(&self, user: &Address, pool: PoolId) -> u128 {
        self.ledger(pool.elevation).user_staked(user, pool.token)
    }

    pub fn withdrawal_tax_bps(
        &self,
        user: &Address,
        token: TokenId,
        now: Timestamp,
    ) -> Result<u64, RouterError> {
        let fees = self.fees(token)?;
        Ok(self
            .state
            .fairness
            .withdrawal_tax_bps(user, token, &fees, now))
    }

    pub fn staking_bonus_bps(&self, user: &Address, token: TokenId, now: Timestamp) -> u64 {
        self.state.fairness.staking_bonus_bps(user, token, now)
    }

    pub fn elevation_multiplier_bps(&self, elevation: Elevation) -> u64 {
        self.state.allocations.multiplier_bps(elevation)
    }

    /// Effective allocation the elevation's pools currently emit at.
    pub fn committed_allocation(&self, elevation: Elevation) -> u128 {
        self.state.allocations.get(elevation).committed_effective
    }

    /// Effective allocation under the current multipliers.
    pub fn normalized_allocation(&self, elevation: Elevation) -> Result<u128, RouterError> {
        self.state.allocations.normalized_effective(elevation)
    }

    pub fn active_pools(&self, elevation: Elevation) -> &[TokenId] {
        self.ledger(elevation).active_pools()
    }

    pub fn interacting_pools(&self, user: &Address, elevation: Elevation) -> Vec<TokenId> {
        self.ledger(elevation).interacting_pools(user)
    }

    pub fn selected_totem(&self, user: &Address, elevation: Elevation) -> Option<Totem> {
        self.ledger(elevation).selected_totem(user).map(|s| s.totem)
    }

    pub fn round_number(&self, elevation: Elevation) -> u64 {
        self.state.scheduler.round_number(elevation)
    }

    pub fn current_round(&self, elevation: Elevation) -> &Round {
        self.state.scheduler.current_round(elevation)
    }

    pub fn elevation_status(&self, elevation: Elevation, now: Timestamp) -> ElevationStatus {
        self.state.scheduler.status(elevation, now)
    }

    pub fn winning_totem_history(&self, elevation: Elevation) -> Vec<(u64, Totem)> {
        self.state.scheduler.winning_totem_history(elevation)
    }

    pub fn next_seed_round_available(&self, elevation: Elevation, now: Timestamp) -> bool {
        let round = self.state.scheduler.current_round(elevation);
        elevation.kind() == ElevationKind::Lottery
            && round.number > 0
            && self.state.randomness.next_seed_round_available(
                elevation,
                round.number,
                round.end,
                now,
            )
    }
}

impl<V: WinningsVesting, E: EverestLocks> StakeView for Router<V, E> {
    type Error = RouterError;

    fn user_staked(&self, user: &Address, elevation: Elevation) -> u128 {
        self.ledger(elevation).user_total_staked(user)
    }

    fn user_claimable(
        &self,
        user: &Address,
        elevation: Elevation,
        now: Timestamp,
    ) -> Result<u128, RouterError> {
        let lctx = self.ledger_ctx(elevation, now);
        Ok(self.ledger(elevation).user_total_claimable(&lctx, user)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_types::BlockHeight;

    fn owner() -> Address {
        Address::new("crn_owner")
    }

    fn alice() -> Address {
        Address::new("crn_alice")
    }

    fn ctx(secs: u64) -> BlockContext {
        BlockContext::new(Timestamp::new(secs), BlockHeight::new(secs), Hash32::ZERO)
    }

    fn router() -> Router {
        let mut config = EngineConfig::default();
        config.params.unlock_delay_secs = [0; Elevation::COUNT];
        config.params.base_round_duration_secs = 1000;
        Router::from_config(&config, Timestamp::new(0)).unwrap()
    }

    #[test]
    fn admin_calls_require_owner() {
        let mut r = router();
        assert!(matches!(
            r.register_token(&alice(), "ROCK", 100, false),
            Err(RouterError::NonOwner(_))
        ));
        assert!(matches!(
            r.set_paused(&alice(), true),
            Err(RouterError::NonOwner(_))
        ));
        r.transfer_ownership(&owner(), alice()).unwrap();
        r.register_token(&alice(), "ROCK", 100, false).unwrap();
        assert!(matches!(
            r.register_token(&owner(), "PEBBLE", 100, false),
            Err(RouterError::NonOwner(_))
        ));
    }

    #[test]
    fn pause_blocks_users_but_not_admin() {
        let mut r = router();
        let token = r.register_token(&owner(), "ROCK", 100, false).unwrap();
        r.add_pool(&owner(), &ctx(0), token, Elevation::Oasis).unwrap();
        r.set_paused(&owner(), true).unwrap();

        let pool = PoolId::new(token, Elevation::Oasis);
        assert!(matches!(
            r.deposit(&alice(), &ctx(0), pool, 10, None),
            Err(RouterError::Paused)
        ));
        assert!(matches!(
            r.rollover(&ctx(0), Elevation::Oasis),
            Err(RouterError::Paused)
        ));
        r.set_emission_per_second(&owner(), &ctx(0), 5).unwrap();
        assert_eq!(r.params().emission_per_second, 5);
    }

    #[test]
    fn out_of_range_totem_is_invalid() {
        let mut r = router();
        let token = r.register_token(&owner(), "ROCK", 100, false).unwrap();
        r.add_pool(&owner(), &ctx(0), token, Elevation::Plains).unwrap();
        r.rollover(&ctx(0), Elevation::Plains).unwrap();
        let pool = PoolId::new(token, Elevation::Plains);
        let result = r.deposit(&alice(), &ctx(1), pool, 10, Some(2));
        assert!(matches!(
            result,
            Err(RouterError::Ledger(LedgerError::InvalidTotem))
        ));
    }

    #[test]
    fn token_fees_respect_caps() {
        let mut r = router();
        let token = r.register_token(&owner(), "ROCK", 100, false).unwrap();
        assert!(matches!(
            r.set_token_fees(&owner(), token, 501, 700, 100),
            Err(RouterError::ParamTooHigh { cap: 500, .. })
        ));
        assert!(matches!(
            r.set_token_fees(&owner(), token, 0, 1001, 100),
            Err(RouterError::ParamTooHigh { cap: 1000, .. })
        ));
        r.set_token_fees(&owner(), token, 100, 900, 200).unwrap();
        let fees = r.token(token).unwrap().fees;
        assert_eq!(fees.deposit_fee_bps, 100);
        assert_eq!(fees.min_withdraw_tax_bps, 200);
    }

    #[test]
    fn fixed_elevation_takes_no_seeds() {
        let mut r = router();
        r.rollover(&ctx(0), Elevation::Oasis).unwrap();
        let seeder = Address::new("crn_seeder");
        let result = r.submit_sealed_seed(&seeder, &ctx(990), Elevation::Oasis, Hash32::ZERO);
        assert!(matches!(
            result,
            Err(RouterError::Randomness(
                cairn_randomness::RandomnessError::SeedRoundNotAvailable(Elevation::Oasis)
            ))
        ));
        assert!(!r.next_seed_round_available(Elevation::Oasis, Timestamp::new(990)));
    }

    #[test]
    fn round_duration_multiplier_applies_from_next_round() {
        let mut r = router();
        r.rollover(&ctx(0), Elevation::Mesa).unwrap();
        r.set_round_duration_multiplier(&owner(), Elevation::Mesa, 3).unwrap();
        assert_eq!(r.current_round(Elevation::Mesa).end, Timestamp::new(2000));
        r.rollover(&ctx(2000), Elevation::Mesa).unwrap();
        assert_eq!(r.current_round(Elevation::Mesa).end, Timestamp::new(5000));
    }
    #[test]
    fn seal_window_must_fit_inside_lockout() {
        let mut r = router();
        r.rollover(&ctx(0), Elevation::Plains).unwrap();
        assert!(!r.scheduler().in_lockout(Elevation::Plains, Timestamp::new(1900)));
        assert!(!r.next_seed_round_available(Elevation::Plains, Timestamp::new(1900)));

        assert!(matches!(
            r.set_seal_window(&owner(), 200),
            Err(RouterError::Config(_))
        ));
        assert!(matches!(
            r.set_lockout_secs(&owner(), 50),
            Err(RouterError::Config(_))
        ));
        assert!(matches!(
            r.set_lockout_secs(&alice(), 300),
            Err(RouterError::NonOwner(_))
        ));

        r.set_lockout_secs(&owner(), 300).unwrap();
        r.set_seal_window(&owner(), 150).unwrap();
        assert!(r.scheduler().in_lockout(Elevation::Plains, Timestamp::new(1900)));
        assert!(r.next_seed_round_available(Elevation::Plains, Timestamp::new(1900)));
        assert_eq!(r.params().lockout_secs, 300);
        assert_eq!(r.randomness().seal_window_secs(), 150);
    }

    #[test]
    fn fairness_params_reshape_tax_and_bonus() {
        let mut r = router();
        let token = r.register_token(&owner(), "ROCK", 100, false).unwrap();
        r.add_pool(&owner(), &ctx(0), token, Elevation::Plains).unwrap();
        r.rollover(&ctx(0), Elevation::Plains).unwrap();
        r.deposit(&alice(), &ctx(1), PoolId::new(token, Elevation::Plains), 100, Some(0))
            .unwrap();

        assert!(matches!(
            r.set_fairness_params(&owner(), 100, 10_001, 100),
            Err(RouterError::ParamTooHigh { cap: 10_000, .. })
        ));
        assert!(matches!(
            r.set_fairness_params(&alice(), 100, 1000, 100),
            Err(RouterError::NonOwner(_))
        ));
        r.set_fairness_params(&owner(), 100, 1000, 100).unwrap();
        let half_way = Timestamp::new(51);
        assert_eq!(r.staking_bonus_bps(&alice(), token, half_way), 500);
        assert_eq!(r.withdrawal_tax_bps(&alice(), token, half_way).unwrap(), 400);
        assert_eq!(r.params().max_bonus_bps, 1000);
    }
}
