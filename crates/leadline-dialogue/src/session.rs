//! The per-call dialogue state machine.
//!
//! A [`Session`] consumes inbound transport events one at a time and returns
//! the actions the connection handler must perform, in order. It never
//! blocks, performs no I/O and takes the current time as an argument, so a
//! whole call can be replayed deterministically in tests.

use crate::config::DialogueContext;
use crate::cooldown::CooldownGuard;
use crate::escalation::{self, EscalationPlan};
use crate::knowledge::TopicHits;
use crate::step::{FranchiseMode, FranchiseStep, Prompt, Step};
use crate::validators;
use leadline_types::{FranchiseDetails, Lead, LeadPayload, LeadType, SupportCategory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Transport events, already decoded from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The call is connected and the transport is ready.
    Setup,
    /// A transcript chunk. Only chunks with `last == true` are acted on.
    Prompt { text: String, last: bool },
    /// The caller spoke over the agent.
    Interrupt,
    /// A keypad digit. Not used by the dialogue.
    Dtmf(String),
    /// The transport reported a failure; the session ends.
    Error(String),
}

/// Work the connection handler performs on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Speak { text: String, interruptible: bool },
    /// Hand the finalized lead to the dispatcher. Emitted at most once.
    Dispatch(LeadPayload),
    /// End the call from the agent side.
    Close,
}

impl Action {
    pub fn speak(text: impl Into<String>) -> Self {
        Self::Speak {
            text: text.into(),
            interruptible: true,
        }
    }

    pub fn speak_final(text: impl Into<String>) -> Self {
        Self::Speak {
            text: text.into(),
            interruptible: false,
        }
    }
}

/// Nested state of the franchise sub-flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FranchiseState {
    pub mode: FranchiseMode,
    pub category: Option<SupportCategory>,
    pub detail: Option<String>,
    pub experience: Option<String>,
}

/// One call's dialogue.
#[derive(Debug)]
pub struct Session {
    ctx: Arc<DialogueContext>,
    step: Step,
    lead: Lead,
    franchise: FranchiseState,
    /// The caller asked for a human; the next finalize is an escalation.
    escalated: bool,
    /// Flips to `true` exactly once, at finalize or when the call ends.
    ended: bool,
    guard: CooldownGuard,
    topic_hits: TopicHits,
}

impl Session {
    pub fn new(ctx: Arc<DialogueContext>) -> Self {
        let guard = CooldownGuard::new(ctx.settings.cooldown);
        Self {
            ctx,
            step: Step::AwaitSetup,
            lead: Lead::default(),
            franchise: FranchiseState::default(),
            escalated: false,
            ended: false,
            guard,
            topic_hits: TopicHits::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn lead(&self) -> &Lead {
        &self.lead
    }

    pub fn franchise(&self) -> &FranchiseState {
        &self.franchise
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    pub fn topic_hits(&self) -> &TopicHits {
        &self.topic_hits
    }

    /// Processes one inbound event to completion.
    pub fn handle(&mut self, event: InboundEvent, now: Instant) -> Vec<Action> {
        let mut out = Vec::new();
        if self.step == Step::Done {
            return out;
        }
        match event {
            InboundEvent::Setup => self.on_setup(now, &mut out),
            InboundEvent::Prompt { text, last } => {
                if last {
                    self.on_utterance(&text, now, &mut out);
                }
            }
            InboundEvent::Interrupt => {
                if let Some(prompt) = self.step.prompt() {
                    self.ask(prompt, now, &mut out);
                }
            }
            InboundEvent::Dtmf(_) => {}
            InboundEvent::Error(description) => self.on_transport_error(&description, &mut out),
        }
        out
    }

    fn advance(&mut self, next: Step) {
        debug!(from = %self.step, to = %next, "step transition");
        self.step = next;
    }

    fn ask(&mut self, prompt: Prompt, now: Instant, out: &mut Vec<Action>) {
        if self.guard.should_ask(prompt, now) {
            out.push(Action::speak(self.ctx.lexicon.prompts.text(prompt)));
        } else {
            debug!(step = %self.step, ?prompt, "prompt suppressed by cooldown");
        }
    }

    fn on_setup(&mut self, now: Instant, out: &mut Vec<Action>) {
        if self.step != Step::AwaitSetup {
            debug!(step = %self.step, "ignoring repeated setup");
            return;
        }
        info!("call setup received");
        self.advance(Step::Role);
        self.ask(Prompt::Role, now, out);
    }

    fn on_transport_error(&mut self, description: &str, out: &mut Vec<Action>) {
        warn!(step = %self.step, description, "transport reported an error, closing");
        self.ended = true;
        self.advance(Step::Done);
        out.push(Action::speak_final(self.ctx.lexicon.prompts.apology.as_str()));
        out.push(Action::Close);
    }

    fn on_utterance(&mut self, raw: &str, now: Instant, out: &mut Vec<Action>) {
        let text = validators::normalize(raw);
        if text.is_empty() {
            return;
        }
        let lowered = text.to_lowercase();
        if self.guard.is_duplicate(&lowered, now) {
            debug!(step = %self.step, "duplicate utterance dropped");
            return;
        }

        if let Step::Franchise(step) = self.step {
            self.on_franchise(step, &text, &lowered, now, out);
            return;
        }

        let ctx = Arc::clone(&self.ctx);
        let lexicon = &ctx.lexicon;

        if self.step.is_active()
            && self.franchise.mode == FranchiseMode::None
            && lexicon.is_franchise(&lowered)
        {
            self.on_franchise_request(now, out);
            return;
        }

        if self.step.is_active() && escalation::detect(lexicon, &lowered) {
            self.on_escalation(&text, now, out);
            return;
        }

        let phone_like = validators::digits(&text).len() >= ctx.settings.premature_phone_min_digits;
        if phone_like && matches!(self.step, Step::Role | Step::City | Step::Zone | Step::Name) {
            self.redirect_premature_phone(now, out);
            return;
        }

        if !(phone_like && self.step == Step::Phone) {
            if let Some(topic) = ctx.knowledge.match_topic(lexicon, self.step, &lowered) {
                debug!(step = %self.step, topic = %topic.id, "answering knowledge topic");
                out.push(Action::speak(self.topic_hits.next_answer(topic)));
                if let Some(prompt) = self.step.prompt() {
                    self.ask(prompt, now, out);
                }
                return;
            }
        }

        match self.step {
            Step::Role => match validators::validate_role(lexicon, &text) {
                Some(role) => {
                    self.lead.role = Some(role);
                    self.advance(Step::City);
                    out.push(Action::speak(lexicon.prompts.ack.as_str()));
                    self.ask(Prompt::City, now, out);
                }
                None => self.ask(Prompt::Role, now, out),
            },
            Step::City => match validators::validate_place(&text) {
                Some(city) => {
                    self.lead.city = Some(city);
                    self.advance(Step::Zone);
                    self.ask(Prompt::Zone, now, out);
                }
                None => self.ask(Prompt::City, now, out),
            },
            Step::Zone => match validators::validate_place(&text) {
                Some(zone) => {
                    self.lead.zone = Some(zone);
                    self.advance(Step::Name);
                    self.ask(Prompt::Name, now, out);
                }
                None => self.ask(Prompt::Zone, now, out),
            },
            Step::Name => match validators::validate_name(&text) {
                Some(name) => {
                    self.lead.name = Some(name);
                    if self.escalated && self.lead.phone.is_some() {
                        self.finalize(LeadType::Escalation, now, out);
                    } else {
                        self.advance(Step::Phone);
                        self.ask(Prompt::Phone, now, out);
                    }
                }
                None => self.ask(Prompt::NameRetry, now, out),
            },
            Step::Phone => match validators::validate_phone(&text) {
                Some(phone) => {
                    self.lead.phone = Some(phone);
                    let lead_type = if self.escalated {
                        LeadType::Escalation
                    } else {
                        LeadType::Lead
                    };
                    self.finalize(lead_type, now, out);
                }
                None => self.ask(Prompt::PhoneRetry, now, out),
            },
            Step::Post => {
                if lexicon.is_farewell(&lowered) {
                    info!("caller said goodbye");
                    self.ended = true;
                    self.advance(Step::Done);
                    out.push(Action::speak_final(lexicon.prompts.farewell.as_str()));
                    out.push(Action::Close);
                } else {
                    self.ask(Prompt::PostNudge, now, out);
                }
            }
            Step::AwaitSetup | Step::Done | Step::Franchise(_) => {}
        }
    }

    fn on_escalation(&mut self, text: &str, now: Instant, out: &mut Vec<Action>) {
        info!(step = %self.step, "caller asked for a human");
        self.escalated = true;
        match escalation::plan(&self.lead) {
            EscalationPlan::CollectName => {
                self.advance(Step::Name);
                self.ask(Prompt::EscalateName, now, out);
            }
            EscalationPlan::CollectPhone => match validators::validate_phone(text) {
                Some(phone) => {
                    self.lead.phone = Some(phone);
                    self.finalize(LeadType::Escalation, now, out);
                }
                None => {
                    self.advance(Step::Phone);
                    self.ask(Prompt::EscalatePhone, now, out);
                }
            },
            EscalationPlan::Handoff { phone } => {
                out.push(Action::speak(self.ctx.lexicon.prompts.handoff_to(&phone)));
                self.advance(Step::Post);
                self.ask(Prompt::Post, now, out);
            }
        }
    }

    fn redirect_premature_phone(&mut self, now: Instant, out: &mut Vec<Action>) {
        debug!(step = %self.step, "phone number given early, redirecting");
        if self.lead.name.is_none() {
            self.advance(Step::Name);
            self.ask(Prompt::PrematureName, now, out);
        } else {
            self.advance(Step::Phone);
            self.ask(Prompt::Phone, now, out);
        }
    }

    fn on_franchise_request(&mut self, now: Instant, out: &mut Vec<Action>) {
        if self.ended {
            let text = self
                .ctx
                .lexicon
                .prompts
                .franchise_elsewhere(&self.ctx.settings.handoff_number);
            out.push(Action::speak(text));
            return;
        }
        info!(step = %self.step, "entering franchise flow");
        self.franchise.mode = FranchiseMode::Ask;
        self.advance(Step::Franchise(FranchiseStep::Ask));
        self.ask(Prompt::Franchise(FranchiseStep::Ask), now, out);
    }

    fn on_franchise(
        &mut self,
        step: FranchiseStep,
        text: &str,
        lowered: &str,
        now: Instant,
        out: &mut Vec<Action>,
    ) {
        let ctx = Arc::clone(&self.ctx);
        let retry = Prompt::Franchise(step);
        match step {
            FranchiseStep::Ask => match ctx.lexicon.franchise_branch(lowered) {
                Some(FranchiseMode::Prospect) => {
                    self.franchise.mode = FranchiseMode::Prospect;
                    self.next_prospect_step(now, out);
                }
                Some(FranchiseMode::Support) => {
                    self.franchise.mode = FranchiseMode::Support;
                    self.advance(Step::Franchise(FranchiseStep::Category));
                    self.ask(Prompt::Franchise(FranchiseStep::Category), now, out);
                }
                _ => self.ask(retry, now, out),
            },
            FranchiseStep::City => match validators::validate_place(text) {
                Some(city) => {
                    self.lead.city = Some(city);
                    self.next_prospect_step(now, out);
                }
                None => self.ask(retry, now, out),
            },
            FranchiseStep::Zone => match validators::validate_place(text) {
                Some(zone) => {
                    self.lead.zone = Some(zone);
                    self.next_prospect_step(now, out);
                }
                None => self.ask(retry, now, out),
            },
            FranchiseStep::Name => match validators::validate_name(text) {
                Some(name) => {
                    self.lead.name = Some(name);
                    self.next_prospect_step(now, out);
                }
                None => self.ask(Prompt::NameRetry, now, out),
            },
            FranchiseStep::Phone => match validators::validate_phone(text) {
                Some(phone) => {
                    self.lead.phone = Some(phone);
                    if self.franchise.mode == FranchiseMode::Support {
                        self.finalize(LeadType::FranchiseSupport, now, out);
                    } else {
                        self.next_prospect_step(now, out);
                    }
                }
                None => self.ask(Prompt::PhoneRetry, now, out),
            },
            FranchiseStep::Experience => match validators::validate_free_text(text) {
                Some(experience) => {
                    self.franchise.experience = Some(experience);
                    self.finalize(LeadType::FranchiseProspect, now, out);
                }
                None => self.ask(retry, now, out),
            },
            FranchiseStep::Category => {
                if validators::validate_free_text(text).is_some() {
                    let category = ctx.lexicon.support_category(lowered);
                    debug!(category = category.as_str(), "support category");
                    self.franchise.category = Some(category);
                    self.advance(Step::Franchise(FranchiseStep::Detail));
                    self.ask(Prompt::Franchise(FranchiseStep::Detail), now, out);
                } else {
                    self.ask(retry, now, out);
                }
            }
            FranchiseStep::Detail => match validators::validate_free_text(text) {
                Some(detail) => {
                    self.franchise.detail = Some(detail);
                    if self.lead.phone.is_some() {
                        self.finalize(LeadType::FranchiseSupport, now, out);
                    } else {
                        self.advance(Step::Franchise(FranchiseStep::Phone));
                        self.ask(Prompt::Franchise(FranchiseStep::Phone), now, out);
                    }
                }
                None => self.ask(retry, now, out),
            },
        }
    }

    /// Moves a prospect to the first slot still missing, or finalizes.
    fn next_prospect_step(&mut self, now: Instant, out: &mut Vec<Action>) {
        let next = if self.lead.city.is_none() {
            FranchiseStep::City
        } else if self.lead.zone.is_none() {
            FranchiseStep::Zone
        } else if self.lead.name.is_none() {
            FranchiseStep::Name
        } else if self.lead.phone.is_none() {
            FranchiseStep::Phone
        } else if self.franchise.experience.is_none() {
            FranchiseStep::Experience
        } else {
            self.finalize(LeadType::FranchiseProspect, now, out);
            return;
        };
        self.advance(Step::Franchise(next));
        self.ask(Prompt::Franchise(next), now, out);
    }

    /// Packages the lead and requests dispatch, once per session.
    fn finalize(&mut self, lead_type: LeadType, now: Instant, out: &mut Vec<Action>) {
        if self.ended {
            warn!(%lead_type, "lead already finalized for this call, not dispatching again");
            if let (LeadType::Escalation, Some(phone)) = (lead_type, self.lead.phone.as_deref()) {
                out.push(Action::speak_final(self.ctx.lexicon.prompts.handoff_to(phone)));
            }
        } else {
            self.ended = true;
            let franchise = lead_type.is_franchise().then(|| FranchiseDetails {
                category: self.franchise.category,
                detail: self.franchise.detail.clone(),
                experience: self.franchise.experience.clone(),
            });
            let payload = LeadPayload {
                lead_type,
                lead: self.lead.clone(),
                franchise,
            };

            let prompts = &self.ctx.lexicon.prompts;
            let confirmation = match lead_type {
                LeadType::Lead => prompts.closing.clone(),
                LeadType::Escalation => {
                    prompts.handoff_to(self.lead.phone.as_deref().unwrap_or_default())
                }
                LeadType::FranchiseProspect => prompts.franchise_prospect_done.clone(),
                LeadType::FranchiseSupport => prompts.franchise_support_done.clone(),
            };
            info!(%lead_type, complete = self.lead.is_complete(), "lead finalized");
            // Dispatch leads the batch so the lead survives a dead transport.
            out.push(Action::Dispatch(payload));
            out.push(Action::speak_final(confirmation));
        }

        if lead_type.is_franchise() {
            self.franchise = FranchiseState::default();
        }
        self.advance(Step::Post);
        self.ask(Prompt::Post, now, out);
    }
}
