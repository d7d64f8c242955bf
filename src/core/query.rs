//! List filtering, ordering and the personal summary stats.

use hashbrown::HashMap;

use crate::record::{Record, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Newest => "new",
            SortOrder::Oldest => "old",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Newest => "新しい順",
            SortOrder::Oldest => "古い順",
        }
    }

    /// `old` sorts ascending; anything else is the default newest-first.
    pub fn from_param(v: &str) -> Self {
        match v {
            "old" => SortOrder::Oldest,
            _ => SortOrder::Newest,
        }
    }

    pub fn all() -> &'static [SortOrder] {
        &[SortOrder::Newest, SortOrder::Oldest]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub order: SortOrder,
}

impl ListQuery {
    pub fn matches(&self, record: &Record) -> bool {
        let term = self.search.trim().to_lowercase();
        term.is_empty() || record.search_text().contains(&term)
    }

    /// Filter by the search term, then order by creation time.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let mut out: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        sort_records(&mut out, self.order);
        out
    }
}

pub fn sort_records(records: &mut [Record], order: SortOrder) {
    match order {
        SortOrder::Newest => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => records.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
}

/// Community records for one shop. No shop selected means nothing to show.
pub fn community_view(records: Vec<Record>, shop: &str, query: &ListQuery) -> Vec<Record> {
    if shop.is_empty() {
        return Vec::new();
    }
    query.apply(records.into_iter().filter(|r| r.shop_name == shop).collect())
}

pub fn personal_view(records: Vec<Record>, user: &User, query: &ListQuery) -> Vec<Record> {
    query.apply(
        records
            .into_iter()
            .filter(|r| r.user_id.as_deref() == Some(user.id.as_str()))
            .collect(),
    )
}

/// Distinct shop names in first-seen order, for the shop picker.
pub fn known_shops(records: &[Record]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in records {
        let name = r.shop_name.trim();
        if !name.is_empty() && !out.iter().any(|s| s == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Noodle portions on an ordinal scale; custom portions are not scored.
const NOODLE_SCORES: [(&str, f32); 4] = [("半分", 1.0), ("少なめ", 2.0), ("小", 3.0), ("大", 4.0)];

const MASH_OPTION: &str = "マシマシ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub top_shop: Option<String>,
    pub avg_noodles: Option<&'static str>,
    /// Percentage of records with garlic マシマシ.
    pub mash_rate: Option<u32>,
}

pub fn compute_stats(records: &[Record]) -> Stats {
    if records.is_empty() {
        return Stats::default();
    }

    // Counts in first-seen order; ties go to the shop seen first.
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for r in records {
        let shop = r.shop_name.as_str();
        let slot = *slots.entry(shop).or_insert_with(|| {
            counts.push((shop, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }
    let top = counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, &(shop, n)| match best {
            Some((_, most)) if most >= n => best,
            _ => Some((shop, n)),
        });

    let scored: Vec<f32> = records
        .iter()
        .filter_map(|r| {
            NOODLE_SCORES
                .iter()
                .find(|(label, _)| *label == r.metrics.noodles.option)
                .map(|(_, s)| *s)
        })
        .collect();
    let avg_noodles = if scored.is_empty() {
        None
    } else {
        let avg = scored.iter().sum::<f32>() / scored.len() as f32;
        NOODLE_SCORES
            .iter()
            .min_by(|a, b| (a.1 - avg).abs().total_cmp(&(b.1 - avg).abs()))
            .map(|(label, _)| *label)
    };

    let mash = records
        .iter()
        .filter(|r| r.metrics.garlic.option == MASH_OPTION)
        .count();
    let mash_rate = ((mash as f32 / records.len() as f32) * 100.0).round() as u32;

    Stats {
        total: records.len(),
        top_shop: top.map(|(s, _)| s.to_string()),
        avg_noodles,
        mash_rate: Some(mash_rate),
    }
}
