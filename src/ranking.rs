//! Ordering of the organization structure page.

use crate::models::gallery::GalleryItem;

/// Positions in display order. Anything else sorts after these.
pub const POSITION_PRIORITY: [&str; 5] = ["ketua", "wakil ketua", "sekretaris", "bendahara", "pj sie"];

pub fn position_rank(position: &str) -> usize {
    let position = position.to_lowercase();
    POSITION_PRIORITY
        .iter()
        .position(|p| *p == position)
        .unwrap_or(POSITION_PRIORITY.len())
}

/// Members of `current_year`, ranked by position. Equal ranks keep input order.
pub fn rank_members(items: &[GalleryItem], current_year: &str) -> Vec<GalleryItem> {
    let mut members: Vec<GalleryItem> = items
        .iter()
        .filter(|item| item.period == current_year)
        .cloned()
        .collect();
    members.sort_by_key(|item| position_rank(&item.position));
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(name: &str, position: &str, period: &str) -> GalleryItem {
        GalleryItem {
            id: name.to_lowercase(),
            image_url: format!("https://example.com/{}.jpg", name.to_lowercase()),
            name: name.to_string(),
            position: position.to_string(),
            period: period.to_string(),
            created_at: Utc::now(),
        }
    }

    fn names(members: &[GalleryItem]) -> Vec<&str> {
        members.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn ranks_known_positions_case_insensitively() {
        let items = vec![
            member("Dewi", "Bendahara", "2025"),
            member("Rizki", "PJ Sie", "2025"),
            member("Sari", "KETUA", "2025"),
            member("Budi", "Sekretaris", "2025"),
            member("Andi", "Wakil Ketua", "2025"),
        ];
        let ranked = rank_members(&items, "2025");
        assert_eq!(names(&ranked), ["Sari", "Andi", "Budi", "Dewi", "Rizki"]);
    }

    #[test]
    fn unknown_positions_go_last_in_input_order() {
        let items = vec![
            member("Tono", "Anggota", "2025"),
            member("Sari", "Ketua", "2025"),
            member("Lina", "Dokumentasi", "2025"),
            member("Maya", "Anggota", "2025"),
        ];
        let ranked = rank_members(&items, "2025");
        assert_eq!(names(&ranked), ["Sari", "Tono", "Lina", "Maya"]);

        let ranks: Vec<usize> = ranked.iter().map(|m| position_rank(&m.position)).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn other_periods_are_never_shown() {
        let items = vec![
            member("Lama", "Ketua", "2024"),
            member("Baru", "Anggota", "2025"),
            member("Kosong", "Ketua", ""),
        ];
        let ranked = rank_members(&items, "2025");
        assert_eq!(names(&ranked), ["Baru"]);
    }

    #[test]
    fn equal_ranks_keep_input_order() {
        let items = vec![
            member("B", "pj sie", "2025"),
            member("A", "PJ SIE", "2025"),
            member("C", "Pj Sie", "2025"),
        ];
        assert_eq!(names(&rank_members(&items, "2025")), ["B", "A", "C"]);
    }
}
