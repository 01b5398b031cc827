//! # Greeting Generator
//!
//! Picks a greeting template for a contact and fills in the name and, when the
//! underlying date is known, the years elapsed.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Injectable entropy source, regenerate draws from every pool
//! - 1.0.0: Initial release with birthday, anniversary and check-in templates

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::features::contacts::Contact;
use crate::features::matching::{years_elapsed, OccasionKind};

/// What the greeting is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occasion {
    Birthday,
    Anniversary,
    /// Generic "how are you" message
    CheckIn,
}

impl From<OccasionKind> for Occasion {
    fn from(kind: OccasionKind) -> Self {
        match kind {
            OccasionKind::Birthday => Occasion::Birthday,
            OccasionKind::Anniversary => Occasion::Anniversary,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Draw from every pool instead of the occasion's own (the "regenerate" action)
    pub force_random: bool,
}

/// Source of template choices
pub trait Entropy {
    /// Index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;
}

/// [`Entropy`] backed by any `rand` generator
pub struct RngEntropy<R>(pub R);

impl RngEntropy<StdRng> {
    pub fn from_os() -> Self {
        RngEntropy(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        RngEntropy(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Entropy for RngEntropy<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }
}

/// Replays a fixed sequence of picks, wrapping around at the end
#[derive(Debug, Clone)]
pub struct ScriptedEntropy {
    picks: Vec<usize>,
    position: usize,
}

impl ScriptedEntropy {
    pub fn new(picks: Vec<usize>) -> Self {
        Self { picks, position: 0 }
    }
}

impl Entropy for ScriptedEntropy {
    fn pick(&mut self, len: usize) -> usize {
        if self.picks.is_empty() {
            return 0;
        }
        let value = self.picks[self.position % self.picks.len()];
        self.position += 1;
        value % len
    }
}

struct Template {
    occasion: Occasion,
    /// Uses `{years}` / `{ordinal}`
    with_years: &'static str,
    plain: &'static str,
}

const BIRTHDAY_TEMPLATES: &[Template] = &[
    Template {
        occasion: Occasion::Birthday,
        with_years: "Happy {ordinal} birthday, {name}! 🎉 Wishing you a fantastic day filled with joy and celebration!",
        plain: "Happy birthday, {name}! 🎉 Wishing you a fantastic day filled with joy and celebration!",
    },
    Template {
        occasion: Occasion::Birthday,
        with_years: "{name}, {years} looks great on you! Happy birthday and have an amazing year ahead! 🎂",
        plain: "Happy birthday, {name}! Have an amazing year ahead! 🎂",
    },
    Template {
        occasion: Occasion::Birthday,
        with_years: "Cheers to {years} years of you, {name}! Hope today is as wonderful as you are. 🥳",
        plain: "Cheers to you, {name}! Hope today is as wonderful as you are. 🥳",
    },
    Template {
        occasion: Occasion::Birthday,
        with_years: "Happy birthday, {name}! Trip number {years} around the sun. Enjoy every minute! ☀️",
        plain: "Happy birthday, {name}! Another trip around the sun. Enjoy every minute! ☀️",
    },
    Template {
        occasion: Occasion::Birthday,
        with_years: "Wishing you the happiest of birthdays, {name}! Here's to {years} and many more. 🎈",
        plain: "Wishing you the happiest of birthdays, {name}! Here's to many more. 🎈",
    },
];

const ANNIVERSARY_TEMPLATES: &[Template] = &[
    Template {
        occasion: Occasion::Anniversary,
        with_years: "Happy {years} year anniversary, {name}! 🥂 Congratulations on this special milestone!",
        plain: "Happy anniversary, {name}! 🥂 Congratulations on this special milestone!",
    },
    Template {
        occasion: Occasion::Anniversary,
        with_years: "{years} years together and still going strong! Happy anniversary, {name}! 💍",
        plain: "Still going strong! Happy anniversary, {name}! 💍",
    },
    Template {
        occasion: Occasion::Anniversary,
        with_years: "Congratulations on {years} wonderful years, {name}! Wishing you many more. ❤️",
        plain: "Congratulations on another wonderful year, {name}! Wishing you many more. ❤️",
    },
    Template {
        occasion: Occasion::Anniversary,
        with_years: "Happy anniversary, {name}! Here's to {years} years of love and laughter. 🥂",
        plain: "Happy anniversary, {name}! Here's to love and laughter. 🥂",
    },
    Template {
        occasion: Occasion::Anniversary,
        with_years: "Cheers to your {ordinal} anniversary, {name}! May the next year be even better. 🎊",
        plain: "Cheers to your anniversary, {name}! May the next year be even better. 🎊",
    },
];

const CHECK_IN_TEMPLATES: &[Template] = &[
    Template {
        occasion: Occasion::CheckIn,
        with_years: "Hi {name}! 👋 Just checking in to see how you're doing. Hope everything is going well!",
        plain: "Hi {name}! 👋 Just checking in to see how you're doing. Hope everything is going well!",
    },
    Template {
        occasion: Occasion::CheckIn,
        with_years: "Hey {name}, it's been a while! How have you been?",
        plain: "Hey {name}, it's been a while! How have you been?",
    },
    Template {
        occasion: Occasion::CheckIn,
        with_years: "Thinking of you today, {name}! Hope life is treating you well. 😊",
        plain: "Thinking of you today, {name}! Hope life is treating you well. 😊",
    },
    Template {
        occasion: Occasion::CheckIn,
        with_years: "Hi {name}! Any news lately? Would love to catch up soon.",
        plain: "Hi {name}! Any news lately? Would love to catch up soon.",
    },
    Template {
        occasion: Occasion::CheckIn,
        with_years: "Hello {name}! Just wanted to say hi and see what you've been up to.",
        plain: "Hello {name}! Just wanted to say hi and see what you've been up to.",
    },
];

fn pool_for(occasion: Occasion) -> &'static [Template] {
    match occasion {
        Occasion::Birthday => BIRTHDAY_TEMPLATES,
        Occasion::Anniversary => ANNIVERSARY_TEMPLATES,
        Occasion::CheckIn => CHECK_IN_TEMPLATES,
    }
}

/// Build a greeting for `contact`.
///
/// `today` is the reference day for the years count. Never fails: a missing
/// date just selects the template variant without a number.
pub fn generate(
    contact: &Contact,
    occasion: Occasion,
    today: NaiveDate,
    options: GenerateOptions,
    entropy: &mut dyn Entropy,
) -> String {
    let template = if options.force_random {
        let total =
            BIRTHDAY_TEMPLATES.len() + ANNIVERSARY_TEMPLATES.len() + CHECK_IN_TEMPLATES.len();
        let index = entropy.pick(total);
        BIRTHDAY_TEMPLATES
            .iter()
            .chain(ANNIVERSARY_TEMPLATES)
            .chain(CHECK_IN_TEMPLATES)
            .nth(index)
            .unwrap_or(&CHECK_IN_TEMPLATES[0])
    } else {
        let pool = pool_for(occasion);
        &pool[entropy.pick(pool.len())]
    };

    let years = years_for(contact, template.occasion, today);
    render(template, contact.name.trim(), years)
}

fn years_for(contact: &Contact, occasion: Occasion, today: NaiveDate) -> Option<u32> {
    let date = match occasion {
        Occasion::Birthday => contact.birthday,
        Occasion::Anniversary => contact.anniversary,
        Occasion::CheckIn => None,
    }?;
    Some(years_elapsed(date, today)).filter(|years| *years > 0)
}

fn render(template: &Template, name: &str, years: Option<u32>) -> String {
    match years {
        Some(years) => template
            .with_years
            .replace("{ordinal}", &ordinal(years))
            .replace("{years}", &years.to_string())
            .replace("{name}", name),
        None => template.plain.replace("{name}", name),
    }
}

/// `1` -> `1st`, `12` -> `12th`, `22` -> `22nd`
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
