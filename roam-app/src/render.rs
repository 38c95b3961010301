use roam_core::{CityOverviewState, SearchState, SuggestPhase, TypeAheadState};
use roam_shared::{Accommodation, FilterSet, TransportItem};
use std::fmt::Write;

pub fn suggestions(state: &TypeAheadState) -> String {
    if let Some(error) = &state.error {
        return format!("  ! {}", error);
    }
    if state.phase != SuggestPhase::Settled {
        return String::new();
    }
    if state.suggestions.is_empty() {
        return format!("  no cities match \"{}\"", state.query());
    }
    let mut out = String::new();
    for (i, s) in state.suggestions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, s.display_name());
    }
    out.trim_end().to_string()
}

pub fn filters(filters: Option<&FilterSet>) -> String {
    let Some(f) = filters else {
        return "  (no filters yet)".to_string();
    };
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    format!(
        "  from {} to {} | dates {} .. {} | travelers {} | trip {} | price {} .. {}",
        or_dash(f.from_city_name.clone()),
        or_dash(f.to_city_name.clone()),
        or_dash(f.from_date.map(|d| d.to_string())),
        or_dash(f.to_date.map(|d| d.to_string())),
        or_dash(f.number_of_travelers.map(|n| n.to_string())),
        or_dash(f.trip_type.map(|t| t.as_str().to_string())),
        or_dash(f.min_price.map(|p| p.to_string())),
        or_dash(f.max_price.map(|p| p.to_string())),
    )
}

fn transport_line(item: &TransportItem) -> String {
    format!(
        "    {} {} -> {} | {} .. {} | {}",
        item.provider.as_deref().unwrap_or("?"),
        item.from_city_name.as_deref().unwrap_or("?"),
        item.to_city_name.as_deref().unwrap_or("?"),
        item.departure.as_deref().unwrap_or("?"),
        item.arrival.as_deref().unwrap_or("?"),
        item.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "n/a".to_string()),
    )
}

pub fn transport(state: &SearchState<TransportItem>) -> String {
    if let Some(error) = &state.error {
        return format!("  ! {}", error);
    }
    if state.results.is_empty() {
        return "  no departures found".to_string();
    }
    let mut out = String::from("  onward:\n");
    for item in &state.results.onward {
        let _ = writeln!(out, "{}", transport_line(item));
    }
    if let Some(ret) = &state.results.return_leg {
        out.push_str("  return:\n");
        for item in ret {
            let _ = writeln!(out, "{}", transport_line(item));
        }
    }
    out.trim_end().to_string()
}

pub fn stays(state: &SearchState<Accommodation>) -> String {
    if let Some(error) = &state.error {
        return format!("  ! {}", error);
    }
    if state.results.onward.is_empty() {
        return "  no stays found".to_string();
    }
    state
        .results
        .onward
        .iter()
        .map(|a| {
            format!(
                "    {} | {} | {}",
                a.name.as_deref().unwrap_or("?"),
                a.rating.map(|r| format!("{:.1}*", r)).unwrap_or_else(|| "unrated".to_string()),
                a.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "n/a".to_string()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn overview(state: &CityOverviewState) -> String {
    if let Some(error) = &state.error {
        return format!("  ! {}", error);
    }
    match &state.bundle {
        Some(bundle) if !bundle.is_empty() => format!(
            "  {}: {} experiences, {} stays, {} transport options",
            state.searched_city.as_deref().unwrap_or("?"),
            bundle.experiences.len(),
            bundle.accommodation_records().len(),
            bundle.transportation.len(),
        ),
        _ => "  nothing found for this city".to_string(),
    }
}
