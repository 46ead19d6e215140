//! Dialogue positions and the prompt keys the cooldown guard tracks.

/// Position of a session in the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Connected, waiting for the transport's setup frame.
    AwaitSetup,
    Role,
    City,
    Zone,
    Name,
    Phone,
    /// Lead captured (or handed off); answering follow-up questions.
    Post,
    /// Terminal. Nothing else is processed.
    Done,
    /// Inside the franchise sub-flow.
    Franchise(FranchiseStep),
}

impl Step {
    /// The prompt re-asked for this step, if it has one.
    pub fn prompt(self) -> Option<Prompt> {
        match self {
            Self::AwaitSetup | Self::Done => None,
            Self::Role => Some(Prompt::Role),
            Self::City => Some(Prompt::City),
            Self::Zone => Some(Prompt::Zone),
            Self::Name => Some(Prompt::Name),
            Self::Phone => Some(Prompt::Phone),
            Self::Post => Some(Prompt::Post),
            Self::Franchise(step) => Some(Prompt::Franchise(step)),
        }
    }

    /// Slot-filling steps of the main flow.
    pub fn is_capture(self) -> bool {
        matches!(
            self,
            Self::Role | Self::City | Self::Zone | Self::Name | Self::Phone
        )
    }

    /// Steps where escalation and franchise detection are live.
    pub fn is_active(self) -> bool {
        self.is_capture() || self == Self::Post
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitSetup => "await_setup",
            Self::Role => "role",
            Self::City => "city",
            Self::Zone => "zone",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Post => "post",
            Self::Done => "done",
            Self::Franchise(step) => step.as_str(),
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Steps of the franchise sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FranchiseStep {
    /// Current franchisee or prospect?
    Ask,
    City,
    Zone,
    Name,
    Phone,
    Experience,
    Category,
    Detail,
}

impl FranchiseStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ask => "franchise.ask",
            Self::City => "franchise.city",
            Self::Zone => "franchise.zone",
            Self::Name => "franchise.name",
            Self::Phone => "franchise.phone",
            Self::Experience => "franchise.exp",
            Self::Category => "franchise.cat",
            Self::Detail => "franchise.detail",
        }
    }
}

/// Which branch of the franchise sub-flow is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FranchiseMode {
    #[default]
    None,
    Ask,
    Prospect,
    Support,
}

/// Keys for every cooldown-gated prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    Role,
    City,
    Zone,
    Name,
    NameRetry,
    Phone,
    PhoneRetry,
    Post,
    PostNudge,
    EscalateName,
    EscalatePhone,
    PrematureName,
    Franchise(FranchiseStep),
}
