//! Creative recommender
//!
//! Finds adsets whose rows fall below the CTR floor and suggests replacement
//! headlines and calls to action. Template choice uses a caller-supplied
//! seeded RNG so a run is reproducible from its configured seed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CreativeSettings, Thresholds};
use crate::error::Result;
use crate::series::mean;
use crate::table::{columns, Table};

const HEADLINES_PER_REC: usize = 3;
const CTAS_PER_REC: usize = 2;

const HEADLINE_TEMPLATES: &[&str] = &[
    "Made for {audience} shoppers: see what's new",
    "Your next favorite is one tap away",
    "Limited stock. Don't miss out",
    "Loved by thousands, built for you",
    "Upgrade your everyday for less",
    "New season, new picks for {audience} buyers",
    "See why customers keep coming back",
    "Free shipping on your first order",
    "The {creative} everyone is talking about",
];

const CTA_TEMPLATES: &[&str] = &[
    "Shop Now",
    "Claim Your Offer",
    "See the Collection",
    "Get Yours Today",
    "Learn More",
    "Try It Risk-Free",
];

const UNKNOWN: &str = "unknown";

/// Copy suggestions for one low-CTR adset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeRecommendation {
    pub campaign_name: String,
    pub adset_name: String,
    /// Mean CTR of the adset's low-CTR rows
    pub original_ctr: f64,
    /// Mean ROAS of the same rows, when the dataset has ROAS
    pub original_roas: Option<f64>,
    pub audience_type: String,
    pub platform: String,
    pub creative_type: String,
    pub original_creative_message: String,
    /// Rows of this adset below the CTR floor
    pub low_ctr_rows: usize,
    pub suggested_headlines: Vec<String>,
    pub suggested_ctas: Vec<String>,
    pub rationale: String,
}

#[derive(Default)]
struct AdsetRows {
    ctr: Vec<f64>,
    roas: Vec<f64>,
    /// Date and index of the most recent row
    latest: Option<(Option<NaiveDate>, usize)>,
}

/// Suggests new copy for adsets under the CTR floor
pub struct CreativeRecommender {
    low_ctr: f64,
    max_recommendations: usize,
}

impl CreativeRecommender {
    pub fn new(thresholds: &Thresholds, settings: &CreativeSettings) -> Self {
        Self {
            low_ctr: thresholds.low_ctr,
            max_recommendations: settings.max_recommendations,
        }
    }

    /// Build recommendations, lowest CTR first
    ///
    /// A table without a `ctr` column yields no recommendations.
    pub fn generate(&self, table: &Table, rng: &mut StdRng) -> Result<Vec<CreativeRecommendation>> {
        let Some(ctr_col) = table.column(columns::CTR) else {
            debug!("No ctr column, skipping creative recommendations");
            return Ok(Vec::new());
        };
        let roas_col = table.column(columns::ROAS);
        let date_col = table.column(columns::DATE);
        let campaign_col = table.column(columns::CAMPAIGN);
        let adset_col = table.column(columns::ADSET);

        let text = |row: usize, col: Option<usize>| -> String {
            col.and_then(|c| table.cell(row, c))
                .unwrap_or(UNKNOWN)
                .to_string()
        };

        let mut groups: BTreeMap<(String, String), AdsetRows> = BTreeMap::new();
        for row in 0..table.len() {
            let Some(ctr) = table.number(row, ctr_col)? else {
                continue;
            };
            if ctr >= self.low_ctr {
                continue;
            }

            let key = (text(row, campaign_col), text(row, adset_col));
            let group = groups.entry(key).or_default();
            group.ctr.push(ctr);
            if let Some(col) = roas_col {
                if let Some(roas) = table.number(row, col)? {
                    group.roas.push(roas);
                }
            }

            let date = match date_col {
                Some(col) => table.date(row, col)?,
                None => None,
            };
            // Later date wins; equal dates fall back to row order
            if group.latest.map_or(true, |latest| (date, row) >= latest) {
                group.latest = Some((date, row));
            }
        }

        let mut recommendations: Vec<CreativeRecommendation> = groups
            .into_iter()
            .filter_map(|((campaign_name, adset_name), group)| {
                let (_, latest) = group.latest?;
                let original_ctr = mean(&group.ctr)?;
                Some(CreativeRecommendation {
                    campaign_name,
                    adset_name,
                    original_ctr,
                    original_roas: mean(&group.roas),
                    audience_type: text(latest, table.column(columns::AUDIENCE)),
                    platform: text(latest, table.column(columns::PLATFORM)),
                    creative_type: text(latest, table.column(columns::CREATIVE_TYPE)),
                    original_creative_message: text(latest, table.column(columns::CREATIVE_MESSAGE)),
                    low_ctr_rows: group.ctr.len(),
                    suggested_headlines: Vec::new(),
                    suggested_ctas: Vec::new(),
                    rationale: String::new(),
                })
            })
            .collect();

        recommendations.sort_by(|a, b| {
            a.original_ctr
                .total_cmp(&b.original_ctr)
                .then_with(|| a.campaign_name.cmp(&b.campaign_name))
                .then_with(|| a.adset_name.cmp(&b.adset_name))
        });
        recommendations.truncate(self.max_recommendations);

        // Draw after sorting so the seed maps to the same adsets every run
        for rec in &mut recommendations {
            rec.suggested_headlines = HEADLINE_TEMPLATES
                .choose_multiple(rng, HEADLINES_PER_REC)
                .map(|t| fill_template(t, rec))
                .collect();
            rec.suggested_ctas = CTA_TEMPLATES
                .choose_multiple(rng, CTAS_PER_REC)
                .map(|t| t.to_string())
                .collect();
            rec.rationale = self.rationale(rec);
        }

        debug!(count = recommendations.len(), "Creative recommendations built");
        Ok(recommendations)
    }

    fn rationale(&self, rec: &CreativeRecommendation) -> String {
        let roas = match rec.original_roas {
            Some(roas) => format!(" while ROAS averaged {:.2}", roas),
            None => String::new(),
        };
        format!(
            "CTR averaged {:.4} across {} row(s) below the {:.4} floor{}. \
             Fresher, benefit-led {} copy aimed at {} audiences on {} should lift engagement.",
            rec.original_ctr,
            rec.low_ctr_rows,
            self.low_ctr,
            roas,
            rec.creative_type.to_lowercase(),
            rec.audience_type,
            rec.platform
        )
    }
}

fn fill_template(template: &str, rec: &CreativeRecommendation) -> String {
    template
        .replace("{audience}", &rec.audience_type)
        .replace("{creative}", &rec.creative_type.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const CSV: &str = "date,campaign_name,adset_name,platform,audience_type,creative_type,creative_message,ctr,roas\n\
                       2024-01-01,Alpha,A1,Facebook,Broad,Image,Old message,0.006,2.0\n\
                       2024-01-02,Alpha,A1,Facebook,Broad,Video,New message,0.004,1.0\n\
                       2024-01-01,Beta,B1,Instagram,Lookalike,Image,Beta message,0.009,3.0\n\
                       2024-01-02,Beta,B1,Instagram,Lookalike,Image,Beta message,0.020,3.5\n\
                       2024-01-01,Gamma,G1,Facebook,Retargeting,Carousel,Gamma message,0.030,5.0\n";

    fn recommender(max: usize) -> CreativeRecommender {
        let thresholds = Thresholds::new(0.15, 0.01).unwrap();
        let settings = CreativeSettings {
            max_recommendations: max,
        };
        CreativeRecommender::new(&thresholds, &settings)
    }

    fn table() -> Table {
        Table::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_low_ctr_adsets_sorted_ascending() {
        let mut rng = StdRng::seed_from_u64(42);
        let recs = recommender(10).generate(&table(), &mut rng).unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].adset_name, "A1");
        assert!((recs[0].original_ctr - 0.005).abs() < 1e-12);
        assert_eq!(recs[0].original_roas, Some(1.5));
        assert_eq!(recs[0].low_ctr_rows, 2);
        assert_eq!(recs[1].adset_name, "B1");
        // Only the low-CTR Beta row counts
        assert_eq!(recs[1].low_ctr_rows, 1);
        assert_eq!(recs[1].original_roas, Some(3.0));
    }

    #[test]
    fn test_latest_row_supplies_creative_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let recs = recommender(10).generate(&table(), &mut rng).unwrap();
        assert_eq!(recs[0].original_creative_message, "New message");
        assert_eq!(recs[0].creative_type, "Video");
        assert_eq!(recs[0].platform, "Facebook");
    }

    #[test]
    fn test_suggestion_counts_and_determinism() {
        let mut first_rng = StdRng::seed_from_u64(7);
        let mut second_rng = StdRng::seed_from_u64(7);
        let first = recommender(10).generate(&table(), &mut first_rng).unwrap();
        let second = recommender(10).generate(&table(), &mut second_rng).unwrap();

        assert_eq!(first, second);
        for rec in &first {
            assert_eq!(rec.suggested_headlines.len(), HEADLINES_PER_REC);
            assert_eq!(rec.suggested_ctas.len(), CTAS_PER_REC);
            assert!(rec.suggested_headlines.iter().all(|h| !h.contains('{')));
            assert!(rec.rationale.contains("below the 0.0100 floor"));
        }
    }

    #[test]
    fn test_cap_applies_after_sorting() {
        let mut rng = StdRng::seed_from_u64(42);
        let recs = recommender(1).generate(&table(), &mut rng).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].campaign_name, "Alpha");
    }

    #[test]
    fn test_missing_ctr_column() {
        let mut table = Table::new(["date", "roas"]);
        table.push_row(["2024-01-01", "2.0"]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(recommender(10).generate(&table, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_missing_optional_columns() {
        let mut table = Table::new(["ctr"]);
        table.push_row(["0.002"]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let recs = recommender(10).generate(&table, &mut rng).unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].campaign_name, "unknown");
        assert_eq!(recs[0].original_roas, None);
        assert!(!recs[0].rationale.contains("ROAS"));
    }
}
