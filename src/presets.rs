//! Curated, hand-reviewed scenarios that can be used without any model call.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Difficulty, Scenario, ScenarioSource};

#[derive(Clone, Debug, Serialize)]
pub struct Preset {
  pub id: &'static str,
  pub title: &'static str,
  pub difficulty: Difficulty,
  pub category: &'static str,
  pub character_name: &'static str,
  pub character_role: &'static str,
  pub scenario_text: &'static str,
  pub success_criteria: Vec<&'static str>,
  pub rubric_text: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct PresetGroup {
  pub difficulty: Difficulty,
  pub presets: Vec<Preset>,
}

impl Preset {
  /// Fresh scenario record for this preset. Each call gets its own id so
  /// attempts on separate runs of the same preset are numbered separately.
  pub fn to_scenario(&self) -> Scenario {
    Scenario {
      id: Uuid::new_v4().to_string(),
      character_name: Some(self.character_name.to_string()),
      character_role: Some(self.character_role.to_string()),
      scenario_text: self.scenario_text.to_string(),
      difficulty: self.difficulty,
      category: self.category.to_string(),
      success_criteria: self.success_criteria.iter().map(|s| s.to_string()).collect(),
      rubric_text: Some(self.rubric_text.to_string()),
      tone: None,
      source: ScenarioSource::Preset,
      preset_id: Some(self.id.to_string()),
      title: Some(self.title.to_string()),
      created_at: Utc::now(),
    }
  }
}

/// The whole catalog, grouped by difficulty from beginner to advanced.
pub fn all_presets() -> Vec<PresetGroup> {
  let catalog = catalog();
  Difficulty::ALL
    .iter()
    .map(|d| PresetGroup {
      difficulty: *d,
      presets: catalog.iter().filter(|p| p.difficulty == *d).cloned().collect(),
    })
    .collect()
}

pub fn preset_by_id(id: &str) -> Option<Preset> {
  catalog().into_iter().find(|p| p.id == id)
}

fn catalog() -> Vec<Preset> {
  vec![
    Preset {
      id: "beg_prof_round_90",
      title: "Professor: Round 89.4% to 90%",
      difficulty: Difficulty::Beginner,
      category: "academic",
      character_name: "Prof. Elena Kim",
      character_role: "Professor",
      scenario_text: "You earned an 89.4% in CS210. You consistently scored in the top quartile and completed all extra credit. \
The syllabus allows rounding at instructor discretion. Request rounding to 90% and offer to discuss briefly in office hours.",
      success_criteria: vec![
        "Identify course and your section/ID",
        "State rounding request clearly",
        "Cite consistent performance or extra credit",
        "Offer a brief follow-up window",
        "Polite, appreciative tone",
      ],
      rubric_text: "Clarity: clear request and course details; Conciseness: <150 words; Tone: respectful; \
Completeness: includes rationale and availability; Politeness: appreciative close.",
    },
    Preset {
      id: "beg_client_delay",
      title: "Client: Minor Delivery Delay",
      difficulty: Difficulty::Beginner,
      category: "business",
      character_name: "Jordan Patel",
      character_role: "Client Success Lead",
      scenario_text: "A supplier recall causes a 3–5 day delay on a non-critical feature. Notify the client, propose a fallback, and share a revised ETA.",
      success_criteria: vec![
        "Acknowledge issue and impact",
        "Provide revised timeline",
        "Propose mitigation",
        "Invite questions",
        "Maintain confident, calm tone",
      ],
      rubric_text: "Clarity: state delay and new date; Conciseness: avoid fluff; Tone: calm/assuring; \
Completeness: includes mitigation; Politeness: professional close.",
    },
    Preset {
      id: "beg_deadline_extension",
      title: "Professor: Deadline Extension",
      difficulty: Difficulty::Beginner,
      category: "academic",
      character_name: "Dr. Ravi Shah",
      character_role: "Professor",
      scenario_text: "You will be traveling for a family obligation during the project deadline week. Request a 72-hour extension and propose a new submission date.",
      success_criteria: vec![
        "State reason briefly",
        "Propose specific new date",
        "Confirm you understand policies",
        "Offer to share proof if needed",
        "Polite tone",
      ],
      rubric_text: "Clarity: reason and ask; Tone: respectful; Completeness: new date; Conciseness: <150 words; Politeness.",
    },
    Preset {
      id: "int_grade_appeal_q3",
      title: "TA: Grade Appeal (Q3 Rubric)",
      difficulty: Difficulty::Intermediate,
      category: "academic",
      character_name: "Alex Rivera",
      character_role: "TA",
      scenario_text: "You believe rubric criteria for Question 3 were misapplied. Reference rubric line items and explain where your answer meets them.",
      success_criteria: vec![
        "Reference rubric criteria by name/number",
        "Point to specific lines in your answer",
        "Request re-evaluation succinctly",
      ],
      rubric_text: "Clarity: specific rubric references; Conciseness; Tone: neutral/professional; Completeness: includes example lines.",
    },
    Preset {
      id: "int_salary_negotiation",
      title: "HR: Salary Negotiation",
      difficulty: Difficulty::Intermediate,
      category: "business",
      character_name: "Morgan Lee",
      character_role: "Recruiter",
      scenario_text: "You received an offer below market by ~8–12%. Provide data-backed range, reiterate enthusiasm, and request an adjusted base.",
      success_criteria: vec![
        "Express enthusiasm",
        "Provide market data range",
        "Make a clear ask",
      ],
      rubric_text: "Clarity: explicit request; Tone: confident/positive; Conciseness; Completeness: includes data.",
    },
    Preset {
      id: "adv_exec_escalation",
      title: "Executive Escalation: Incident Summary",
      difficulty: Difficulty::Advanced,
      category: "business",
      character_name: "Dana Brooks",
      character_role: "VP Engineering",
      scenario_text: "After a sev-2 outage (47 minutes), send an executive-ready summary with root cause hypothesis, impact, and owners for next steps.",
      success_criteria: vec![
        "Impact in numbers",
        "Root cause hypothesis",
        "Owners and next steps",
      ],
      rubric_text: "Clarity: crisp executive summary; Tone: accountable; Completeness: impact + owners; Conciseness.",
    },
    Preset {
      id: "adv_client_concession",
      title: "Client: Price Concession Trade",
      difficulty: Difficulty::Advanced,
      category: "business",
      character_name: "Taylor Ng",
      character_role: "Client Director",
      scenario_text: "Client requests a 7% discount. Propose a conditional concession tied to volume/term while protecting margins.",
      success_criteria: vec![
        "Conditional concession",
        "Protect margin language",
        "Next-step proposal",
      ],
      rubric_text: "Clarity: condition structure; Tone: firm but collaborative; Completeness: terms; Conciseness.",
    },
  ]
}
