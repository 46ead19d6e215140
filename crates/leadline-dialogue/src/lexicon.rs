//! Locale pattern tables and spoken texts.
//!
//! Every keyword decision the dialogue makes (role, escalation, franchise,
//! farewell, support category) goes through a regex compiled here, so the
//! tables can be tested on their own and swapped per language tag.

use crate::error::LexiconError;
use crate::step::{FranchiseStep, Prompt};
use leadline_types::{Role, SupportCategory};
use regex::{Regex, RegexBuilder};

/// Raw pattern sources for one locale.
struct PatternTable {
    owner: &'static str,
    tenant: &'static str,
    escalation: &'static str,
    franchise: &'static str,
    prospect: &'static str,
    support: &'static str,
    farewell: &'static str,
    categories: [(SupportCategory, &'static str); 4],
}

const SPANISH_PATTERNS: PatternTable = PatternTable {
    owner: r"\bpropiet|\bdue[ñn][oa]s?\b|\barrendador",
    tenant: r"\binquilin|\balquil(ar|o|a|e|amos|ando)?\b|\bbusco (una )?habitaci|\barrendatari",
    escalation: r"\bay[uú]d(a|ar|e|en|eme|enme)\b|\basesor|\bagente\b|\boperador|\bhumano\b|\bhablar con (una |alguna )?persona\b|\bll[aá]m(a|e|en|ad)me\b|\bque me llamen\b|\bme (puede|pueden|podéis|podeis) llamar\b|\bcont[aá]ct(a|e|en|ad)me\b|\bcontactar\b",
    franchise: r"franquici",
    prospect: r"interesad|\babrir\b|\bquiero ser\b|\bme gustar[ií]a ser\b|\binformaci[oó]n\b|\bnuev[oa]s?\b|\bunirme\b",
    support: r"\bya soy\b|\bactual\b|\bsoy franquiciad|\bincidencia|\bsoporte\b|\bproblema|\btengo una duda\b",
    farewell: r"^(no|nada)\b|\bgracias\b|\badi[oó]s\b|\bhasta luego\b|\bnada m[aá]s\b|\beso es todo\b",
    categories: [
        (SupportCategory::Payments, r"\bpag|\bcobr|liquidaci|factur|comisi"),
        (SupportCategory::Contracts, r"contrat|\bfirm|logalty"),
        (SupportCategory::Tenants, r"inquilin|hu[eé]sped|convivencia"),
        (SupportCategory::Platform, r"plataforma|\bapp\b|aplicaci|\bweb\b|acceso|contraseña"),
    ],
};

const ENGLISH_PATTERNS: PatternTable = PatternTable {
    owner: r"\bowner\b|\blandlord|\bi own\b",
    tenant: r"\btenant|\brent(ing)?\b|\blooking for a room\b",
    escalation: r"\bhelp\b|\bagent\b|\bhuman\b|\boperator\b|\badvisor\b|\b(talk|speak) to (a person|someone|somebody)\b|\bcall me\b|\bcontact me\b",
    franchise: r"franchis",
    prospect: r"\binterested\b|\bopen\b|\bnew\b|\bbecome\b|\binformation\b|\binfo\b",
    support: r"\balready\b|\bcurrent\b|\bexisting\b|\bsupport\b|\bissue\b|\bproblem\b",
    farewell: r"^(no|nope|nothing)\b|\bthanks\b|\bthank you\b|\bgood ?bye\b|\bbye\b|\bthat'?s all\b",
    categories: [
        (SupportCategory::Payments, r"\bpay|settlement|commission|invoice"),
        (SupportCategory::Contracts, r"contract|\bsign"),
        (SupportCategory::Tenants, r"tenant|\bguest"),
        (SupportCategory::Platform, r"platform|\bapp\b|website|login|password"),
    ],
};

/// Spoken texts for one locale.
///
/// `{phone}` and `{number}` placeholders are filled at speak time.
#[derive(Debug, Clone)]
pub struct Prompts {
    pub role: String,
    pub city: String,
    pub zone: String,
    pub name: String,
    pub name_retry: String,
    pub phone: String,
    pub phone_retry: String,
    pub post: String,
    pub post_nudge: String,
    pub ack: String,
    pub closing: String,
    pub escalate_name: String,
    pub escalate_phone: String,
    pub handoff: String,
    pub premature_name: String,
    pub farewell: String,
    pub apology: String,
    pub franchise_ask: String,
    pub franchise_city: String,
    pub franchise_zone: String,
    pub franchise_name: String,
    pub franchise_phone: String,
    pub franchise_experience: String,
    pub franchise_category: String,
    pub franchise_detail: String,
    pub franchise_prospect_done: String,
    pub franchise_support_done: String,
    pub franchise_elsewhere: String,
}

impl Prompts {
    pub fn spanish() -> Self {
        Self {
            role: "Para atenderle: ¿Es usted propietario o inquilino?".into(),
            city: "¿En qué población está interesado?".into(),
            zone: "¿Qué zona o barrio?".into(),
            name: "¿Su nombre completo?".into(),
            name_retry: "¿Su nombre completo, por favor?".into(),
            phone: "¿Su teléfono de contacto, por favor?".into(),
            phone_retry: "¿Me facilita un teléfono de nueve dígitos?".into(),
            post: "¿Desea más información o ayuda?".into(),
            post_nudge: "¿Quiere que le llame un asesor? Si es así, dígame 'ayuda'.".into(),
            ack: "Gracias.".into(),
            closing: "Gracias. Tomamos sus datos. Le contactaremos en breve.".into(),
            escalate_name: "Perfecto. Para ayudarle ahora mismo, ¿su nombre completo?".into(),
            escalate_phone: "Perfecto. Para ayudarle ahora mismo, ¿su teléfono de contacto?".into(),
            handoff: "De acuerdo. Un asesor le llamará al {phone} en breve.".into(),
            premature_name: "Antes del teléfono, ¿me dice su nombre completo?".into(),
            farewell: "Gracias por su llamada. Hasta pronto.".into(),
            apology: "Disculpe. Estamos teniendo problemas. Inténtelo más tarde.".into(),
            franchise_ask: "Área de franquiciados. ¿Es usted franquiciado actual o está interesado en abrir una franquicia?".into(),
            franchise_city: "¿En qué población le interesa la franquicia?".into(),
            franchise_zone: "¿En qué zona de esa población?".into(),
            franchise_name: "¿Su nombre completo?".into(),
            franchise_phone: "¿Un teléfono de contacto de nueve dígitos?".into(),
            franchise_experience: "¿Tiene experiencia en el sector inmobiliario o en gestión de alquileres?".into(),
            franchise_category: "¿Sobre qué es su consulta: pagos, contratos, inquilinos o la plataforma?".into(),
            franchise_detail: "Cuénteme brevemente qué ocurre.".into(),
            franchise_prospect_done: "Gracias. Le enviaremos la información de franquicia y le llamaremos en breve.".into(),
            franchise_support_done: "Gracias. Hemos registrado su incidencia y un responsable le llamará en breve.".into(),
            franchise_elsewhere: "Para franquicias puede llamar directamente al {number}.".into(),
        }
    }

    pub fn english() -> Self {
        Self {
            role: "To help you: are you a property owner or a tenant?".into(),
            city: "Which city are you interested in?".into(),
            zone: "Which area or neighbourhood?".into(),
            name: "Your full name?".into(),
            name_retry: "Your full name, please?".into(),
            phone: "Your contact phone number, please?".into(),
            phone_retry: "Could you give me a nine-digit phone number?".into(),
            post: "Would you like more information or help?".into(),
            post_nudge: "Would you like an advisor to call you? If so, just say 'help'.".into(),
            ack: "Thank you.".into(),
            closing: "Thank you. We have your details and will contact you shortly.".into(),
            escalate_name: "Sure. To help you right away, your full name?".into(),
            escalate_phone: "Sure. To help you right away, your contact phone number?".into(),
            handoff: "All right. An advisor will call you at {phone} shortly.".into(),
            premature_name: "Before the phone number, could you tell me your full name?".into(),
            farewell: "Thank you for calling. Goodbye.".into(),
            apology: "Sorry. We are having problems. Please try again later.".into(),
            franchise_ask: "Franchise area. Are you a current franchisee or interested in opening a franchise?".into(),
            franchise_city: "Which city are you interested in for the franchise?".into(),
            franchise_zone: "Which area of that city?".into(),
            franchise_name: "Your full name?".into(),
            franchise_phone: "A nine-digit contact phone number?".into(),
            franchise_experience: "Do you have experience in real estate or rental management?".into(),
            franchise_category: "What is your request about: payments, contracts, tenants or the platform?".into(),
            franchise_detail: "Briefly tell me what is happening.".into(),
            franchise_prospect_done: "Thank you. We will send you the franchise information and call you shortly.".into(),
            franchise_support_done: "Thank you. Your request is logged and a manager will call you shortly.".into(),
            franchise_elsewhere: "For franchise matters you can call {number} directly.".into(),
        }
    }

    /// Text for a cooldown-gated prompt.
    pub fn text(&self, prompt: Prompt) -> &str {
        match prompt {
            Prompt::Role => &self.role,
            Prompt::City => &self.city,
            Prompt::Zone => &self.zone,
            Prompt::Name => &self.name,
            Prompt::NameRetry => &self.name_retry,
            Prompt::Phone => &self.phone,
            Prompt::PhoneRetry => &self.phone_retry,
            Prompt::Post => &self.post,
            Prompt::PostNudge => &self.post_nudge,
            Prompt::EscalateName => &self.escalate_name,
            Prompt::EscalatePhone => &self.escalate_phone,
            Prompt::PrematureName => &self.premature_name,
            Prompt::Franchise(step) => match step {
                FranchiseStep::Ask => &self.franchise_ask,
                FranchiseStep::City => &self.franchise_city,
                FranchiseStep::Zone => &self.franchise_zone,
                FranchiseStep::Name => &self.franchise_name,
                FranchiseStep::Phone => &self.franchise_phone,
                FranchiseStep::Experience => &self.franchise_experience,
                FranchiseStep::Category => &self.franchise_category,
                FranchiseStep::Detail => &self.franchise_detail,
            },
        }
    }

    /// Handoff confirmation naming the callback number.
    pub fn handoff_to(&self, phone: &str) -> String {
        self.handoff.replace("{phone}", phone)
    }

    /// Redirect for franchise requests once the call's lead is already sent.
    pub fn franchise_elsewhere(&self, number: &str) -> String {
        self.franchise_elsewhere.replace("{number}", number)
    }
}

/// Compiled pattern tables plus spoken texts for one language.
#[derive(Debug, Clone)]
pub struct Lexicon {
    language: &'static str,
    owner: Regex,
    tenant: Regex,
    escalation: Regex,
    franchise: Regex,
    prospect: Regex,
    support: Regex,
    farewell: Regex,
    categories: Vec<(SupportCategory, Regex)>,
    pub prompts: Prompts,
}

fn compile(table: &'static str, pattern: &str) -> Result<Regex, LexiconError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| LexiconError::Pattern { table, source })
}

impl Lexicon {
    fn build(
        language: &'static str,
        table: &PatternTable,
        prompts: Prompts,
    ) -> Result<Self, LexiconError> {
        let categories = table
            .categories
            .iter()
            .map(|(category, pattern)| Ok((*category, compile("category", pattern)?)))
            .collect::<Result<Vec<_>, LexiconError>>()?;

        Ok(Self {
            language,
            owner: compile("owner", table.owner)?,
            tenant: compile("tenant", table.tenant)?,
            escalation: compile("escalation", table.escalation)?,
            franchise: compile("franchise", table.franchise)?,
            prospect: compile("prospect", table.prospect)?,
            support: compile("support", table.support)?,
            farewell: compile("farewell", table.farewell)?,
            categories,
            prompts,
        })
    }

    pub fn spanish() -> Result<Self, LexiconError> {
        Self::build("es", &SPANISH_PATTERNS, Prompts::spanish())
    }

    pub fn english() -> Result<Self, LexiconError> {
        Self::build("en", &ENGLISH_PATTERNS, Prompts::english())
    }

    /// Picks a lexicon from a BCP-47 style tag (`es-ES`, `en-US`, ...).
    ///
    /// Unknown languages fall back to Spanish.
    pub fn for_language(tag: &str) -> Result<Self, LexiconError> {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Self::english(),
            "es" => Self::spanish(),
            _ => {
                tracing::warn!(language = tag, "no lexicon for language, using Spanish");
                Self::spanish()
            }
        }
    }

    pub fn language(&self) -> &'static str {
        self.language
    }

    /// Classifies a role answer. Owner synonyms win when both match.
    pub fn role(&self, text: &str) -> Option<Role> {
        if self.owner.is_match(text) {
            Some(Role::Owner)
        } else if self.tenant.is_match(text) {
            Some(Role::Tenant)
        } else {
            None
        }
    }

    pub fn is_role_keyword(&self, text: &str) -> bool {
        self.role(text).is_some()
    }

    pub fn is_escalation(&self, text: &str) -> bool {
        self.escalation.is_match(text)
    }

    pub fn is_franchise(&self, text: &str) -> bool {
        self.franchise.is_match(text)
    }

    pub fn is_farewell(&self, text: &str) -> bool {
        self.farewell.is_match(text)
    }

    /// Classifies the answer to the franchise "current or prospect" question.
    pub fn franchise_branch(&self, text: &str) -> Option<crate::step::FranchiseMode> {
        use crate::step::FranchiseMode;
        if self.prospect.is_match(text) {
            Some(FranchiseMode::Prospect)
        } else if self.support.is_match(text) {
            Some(FranchiseMode::Support)
        } else {
            None
        }
    }

    /// First matching support category, or `Other`.
    pub fn support_category(&self, text: &str) -> SupportCategory {
        self.categories
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map_or(SupportCategory::Other, |(category, _)| *category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::FranchiseMode;

    #[test]
    fn builtin_tables_compile() {
        assert_eq!(Lexicon::spanish().unwrap().language(), "es");
        assert_eq!(Lexicon::english().unwrap().language(), "en");
    }

    #[test]
    fn language_tag_selection() {
        assert_eq!(Lexicon::for_language("es-ES").unwrap().language(), "es");
        assert_eq!(Lexicon::for_language("en_GB").unwrap().language(), "en");
        assert_eq!(Lexicon::for_language("fr-FR").unwrap().language(), "es");
        assert_eq!(Lexicon::for_language("").unwrap().language(), "es");
    }

    #[test]
    fn spanish_roles() {
        let lx = Lexicon::spanish().unwrap();
        assert_eq!(lx.role("soy propietario"), Some(Role::Owner));
        assert_eq!(lx.role("la propietaria"), Some(Role::Owner));
        assert_eq!(lx.role("soy el dueño del piso"), Some(Role::Owner));
        assert_eq!(lx.role("inquilino"), Some(Role::Tenant));
        assert_eq!(lx.role("quiero alquilar"), Some(Role::Tenant));
        assert_eq!(lx.role("busco una habitación"), Some(Role::Tenant));
        assert_eq!(lx.role("no sé"), None);
        // Owner wins over tenant wording.
        assert_eq!(lx.role("soy propietario y quiero alquilar"), Some(Role::Owner));
    }

    #[test]
    fn spanish_escalation() {
        let lx = Lexicon::spanish().unwrap();
        for text in [
            "ayuda",
            "necesito ayuda",
            "¿me puede ayudar?",
            "quiero hablar con un asesor",
            "hablar con una persona",
            "llámame",
            "que me llamen",
            "contáctenme",
        ] {
            assert!(lx.is_escalation(text), "{text} should escalate");
        }
        for text in ["madrid", "juan pérez", "propietario", "mi teléfono de contacto"] {
            assert!(!lx.is_escalation(text), "{text} should not escalate");
        }
    }

    #[test]
    fn spanish_farewell_is_whole_word() {
        let lx = Lexicon::spanish().unwrap();
        assert!(lx.is_farewell("no"));
        assert!(lx.is_farewell("no, gracias"));
        assert!(lx.is_farewell("adiós"));
        assert!(lx.is_farewell("nada más"));
        assert!(!lx.is_farewell("noviembre"));
        assert!(!lx.is_farewell("precios"));
    }

    #[test]
    fn franchise_branches() {
        let lx = Lexicon::spanish().unwrap();
        assert!(lx.is_franchise("me interesa una franquicia"));
        assert_eq!(lx.franchise_branch("quiero ser franquiciado"), Some(FranchiseMode::Prospect));
        assert_eq!(lx.franchise_branch("estoy interesado"), Some(FranchiseMode::Prospect));
        assert_eq!(lx.franchise_branch("ya soy franquiciado"), Some(FranchiseMode::Support));
        assert_eq!(lx.franchise_branch("soy franquiciado"), Some(FranchiseMode::Support));
        assert_eq!(lx.franchise_branch("pues no lo sé"), None);
    }

    #[test]
    fn support_categories() {
        let lx = Lexicon::spanish().unwrap();
        assert_eq!(lx.support_category("no me llega la liquidación"), SupportCategory::Payments);
        assert_eq!(lx.support_category("un contrato"), SupportCategory::Contracts);
        assert_eq!(lx.support_category("un inquilino ruidoso"), SupportCategory::Tenants);
        assert_eq!(lx.support_category("no puedo entrar en la app"), SupportCategory::Platform);
        assert_eq!(lx.support_category("otra cosa"), SupportCategory::Other);
    }

    #[test]
    fn english_tables() {
        let lx = Lexicon::english().unwrap();
        assert_eq!(lx.role("i'm the landlord"), Some(Role::Owner));
        assert_eq!(lx.role("i want to rent"), Some(Role::Tenant));
        assert!(lx.is_escalation("please call me"));
        assert!(lx.is_franchise("franchise info"));
        assert!(lx.is_farewell("no thanks"));
    }

    #[test]
    fn placeholders_are_filled() {
        let prompts = Prompts::spanish();
        assert_eq!(
            prompts.handoff_to("612345678"),
            "De acuerdo. Un asesor le llamará al 612345678 en breve."
        );
        assert!(prompts.franchise_elsewhere("+34600000000").contains("+34600000000"));
    }
}
