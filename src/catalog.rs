// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Instant;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::candidate::Candidate;
use crate::types::candidate::CandidateId;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    restaurant: Vec<Candidate>,
}

/// Loads the catalog at `path`, or the built-in catalog if no path is given.
pub fn load_catalog(path: Option<&Path>) -> Fallible<Vec<Candidate>> {
    match path {
        Some(path) => {
            if !path.exists() {
                return fail("catalog file does not exist.");
            }
            log::debug!("Loading catalog...");
            let start = Instant::now();
            let candidates = parse_catalog(&read_to_string(path)?)?;
            let duration = start.elapsed().as_millis();
            log::debug!("Catalog loaded in {duration}ms.");
            Ok(candidates)
        }
        None => Ok(builtin_catalog()),
    }
}

pub fn parse_catalog(text: &str) -> Fallible<Vec<Candidate>> {
    let file: CatalogFile = toml::from_str(text)?;
    validate(&file.restaurant)?;
    Ok(file.restaurant)
}

fn validate(candidates: &[Candidate]) -> Fallible<()> {
    if candidates.is_empty() {
        return fail("catalog has no restaurants.");
    }
    let mut seen: HashSet<&CandidateId> = HashSet::new();
    for candidate in candidates {
        if !seen.insert(&candidate.id) {
            return fail(format!("duplicate restaurant id: {}", candidate.id));
        }
        if !(0.0..=5.0).contains(&candidate.rating) {
            return fail(format!(
                "restaurant {} has a rating outside 0-5: {}",
                candidate.id, candidate.rating
            ));
        }
        if candidate.trust_score > 100 {
            return fail(format!(
                "restaurant {} has a trust score above 100: {}",
                candidate.id, candidate.trust_score
            ));
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn restaurant(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    tag: &str,
    rating: f64,
    trust_score: u8,
    distance: &str,
    price_range: &str,
    address: &str,
    highlights: &[&str],
) -> Candidate {
    Candidate {
        id: CandidateId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        tag: tag.to_string(),
        image_url: format!("https://picsum.photos/seed/foodin{id}/600/1000"),
        rating,
        trust_score,
        distance: distance.to_string(),
        price_range: price_range.to_string(),
        address: address.to_string(),
        highlights: highlights.iter().map(|h| h.to_string()).collect(),
    }
}

/// The demo catalog: five spots in District 1, Ho Chi Minh City.
pub fn builtin_catalog() -> Vec<Candidate> {
    vec![
        restaurant(
            "1",
            "Cục Gạch Quán",
            "Traditional Vietnamese cuisine in a nostalgic, French-colonial villa setting. Famous for its authenticity.",
            "Vietnamese",
            "Nostalgic - Family - D1",
            4.8,
            98,
            "1.2 km",
            "$$$",
            "10 Dang Tat, District 1, HCMC",
            &[
                "Fried Tofu with Lemongrass",
                "Soft Shell Crab",
                "Claypot Pork",
            ],
        ),
        restaurant(
            "2",
            "Pizza 4P's Ben Thanh",
            "Japanese-Italian fusion pizza with house-made cheese. A modern classic in Vietnam.",
            "Pizza/Italian",
            "Modern - Cheese - D1",
            4.9,
            99,
            "0.5 km",
            "$$$",
            "8 Thu Khoa Huan, District 1, HCMC",
            &[
                "Burrata Parma Ham Pizza",
                "Crab Tomato Cream Spaghetti",
                "Camembert",
            ],
        ),
        restaurant(
            "3",
            "Bánh Mì Huỳnh Hoa",
            "The most famous Bánh Mì in Saigon. Heavy on meat, pâté, and flavor.",
            "Street Food",
            "Iconic - Meat - D1",
            4.5,
            92,
            "2.0 km",
            "$",
            "26 Le Thi Rieng, District 1, HCMC",
            &["Bánh Mì Đặc Biệt"],
        ),
        restaurant(
            "4",
            "The Workshop Coffee",
            "Specialty coffee roaster in a high-ceiling industrial loft. Perfect for working.",
            "Cafe",
            "Workspace - Specialty - D1",
            4.6,
            95,
            "0.8 km",
            "$$",
            "27 Ngo Duc Ke, District 1, HCMC",
            &["Cold Brew", "V60 Pour Over", "Pasta"],
        ),
        restaurant(
            "5",
            "Anan Saigon",
            "Michelin-starred modern Vietnamese cuisine. Innovative takes on street food classics.",
            "Fine Dining",
            "Michelin - Innovative - D1",
            4.7,
            97,
            "1.5 km",
            "$$$$",
            "89 Ton That Dam, District 1, HCMC",
            &["Banh Xeo Taco", "Da Lat Pizza", "Pho Pot Au Feu"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const TWO_SPOTS: &str = r#"
        [[restaurant]]
        id = "a"
        name = "Phở Hòa"
        description = "Beef noodle soup."
        category = "Noodles"
        tag = "Classic - Broth - D3"
        image_url = "https://example.com/a.jpg"
        rating = 4.4
        trust_score = 90
        distance = "3.1 km"
        price_range = "$"
        address = "260C Pasteur, District 3, HCMC"
        highlights = ["Phở Tái"]

        [[restaurant]]
        id = "b"
        name = "Bún Chả 145"
        description = "Grilled pork with noodles."
        category = "Noodles"
        tag = "Smoky - Pork - D1"
        image_url = "https://example.com/b.jpg"
        rating = 4.2
        trust_score = 88
        distance = "1.0 km"
        price_range = "$"
        address = "145 Bui Vien, District 1, HCMC"
    "#;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 5);
        assert!(validate(&catalog).is_ok());
    }

    #[test]
    fn test_parse_catalog() -> Fallible<()> {
        let catalog = parse_catalog(TWO_SPOTS)?;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].id, CandidateId::new("a"));
        assert_eq!(catalog[0].highlights, vec!["Phở Tái".to_string()]);
        assert!(catalog[1].highlights.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_catalog() {
        let result = parse_catalog("");
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: catalog has no restaurants.".to_string())
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let text = TWO_SPOTS.replace("id = \"b\"", "id = \"a\"");
        let result = parse_catalog(&text);
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: duplicate restaurant id: a".to_string())
        );
    }

    #[test]
    fn test_bad_rating() {
        let text = TWO_SPOTS.replace("rating = 4.4", "rating = 7.0");
        assert!(parse_catalog(&text).is_err());
    }

    #[test]
    fn test_bad_trust_score() {
        let text = TWO_SPOTS.replace("trust_score = 90", "trust_score = 101");
        assert!(parse_catalog(&text).is_err());
    }

    #[test]
    fn test_load_catalog_from_file() -> Fallible<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{TWO_SPOTS}")?;
        let catalog = load_catalog(Some(file.path()))?;
        assert_eq!(catalog.len(), 2);
        Ok(())
    }

    #[test]
    fn test_load_missing_catalog() {
        assert!(load_catalog(Some(Path::new("./derpherp.toml"))).is_err());
    }

    #[test]
    fn test_load_builtin_catalog() -> Fallible<()> {
        assert_eq!(load_catalog(None)?, builtin_catalog());
        Ok(())
    }

    #[test]
    fn test_demo_catalog() -> Fallible<()> {
        let catalog = parse_catalog(include_str!("../demos/catalog.toml"))?;
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0].highlights.len(), 2);
        assert!(catalog[1].highlights.is_empty());
        Ok(())
    }
}
