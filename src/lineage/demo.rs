use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{LifeState, LineageIndex, LineageNode, TaxonomicRank};

const GENUS_SYLLABLES: [&str; 12] = [
    "Ther", "Aqua", "Silv", "Pyro", "Lith", "Noct", "Vel", "Cory", "Mega", "Arbo", "Dendr", "Phyl",
];
const EPITHET_SYLLABLES: [&str; 10] = [
    "ata", "ensis", "ifera", "oides", "ula", "inus", "aris", "osa", "ella", "icus",
];
const COMMON_PREFIXES: [&str; 10] = [
    "Ash", "Reed", "Dusk", "Stone", "Marsh", "Ember", "Frost", "Moss", "Tide", "Dune",
];
const COMMON_SUFFIXES: [&str; 8] = [
    "crawler", "grazer", "stalker", "wing", "fin", "burrower", "shell", "runner",
];

/// Builds a seeded synthetic lineage so the viewer can run without a data file.
///
/// The output contains several founding roots, one orphan citing a missing parent,
/// subspecies, hybrids with a secondary parent, and extinct branches.
pub fn generate_demo_lineage(count: usize, seed: u64) -> Vec<LineageNode> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut nodes: Vec<LineageNode> = Vec::with_capacity(count);
    if count == 0 {
        return nodes;
    }

    let founders = count.clamp(1, 3);
    for index in 0..founders {
        let mut node = LineageNode::new(format!("L{}", index + 1), None);
        node.trophic_level = rng.random_range(1.0..2.0);
        name_node(&mut node, &mut rng);
        nodes.push(node);
    }

    if count > founders {
        let mut orphan = LineageNode::new("X1", Some("LOST"));
        orphan.birth_turn = 4;
        orphan.trophic_level = 2.5;
        name_node(&mut orphan, &mut rng);
        nodes.push(orphan);
    }

    while nodes.len() < count {
        let parent_index = pick_parent(&nodes, &mut rng);
        let parent = &nodes[parent_index];
        let parent_code = parent.lineage_code.clone();
        let child_number = nodes
            .iter()
            .filter(|node| node.parent() == Some(parent_code.as_str()))
            .count();

        let mut node = LineageNode::new(
            format!("{parent_code}{}", child_suffix(child_number)),
            Some(parent_code.as_str()),
        );
        node.birth_turn = parent.birth_turn + rng.random_range(1..6);
        node.trophic_level = (parent.trophic_level + rng.random_range(-0.6..0.6)).clamp(1.0, 5.0);

        let roll: f32 = rng.random();
        if roll < 0.10 {
            node.taxonomic_rank = TaxonomicRank::Subspecies;
        } else if roll < 0.16 && nodes.len() > 4 {
            let other = rng.random_range(0..nodes.len());
            if nodes[other].lineage_code != parent_code {
                node.taxonomic_rank = TaxonomicRank::Hybrid;
                node.hybrid_parent_codes =
                    vec![parent_code.clone(), nodes[other].lineage_code.clone()];
            }
        }

        if rng.random_bool(0.22) {
            node.state = LifeState::Extinct;
            node.extinction_turn = Some(node.birth_turn + rng.random_range(2..20));
        }

        name_node(&mut node, &mut rng);
        nodes.push(node);
    }

    let index = LineageIndex::build(&nodes);
    let counts = nodes
        .iter()
        .map(|node| index.descendants(&nodes, &node.lineage_code).len() as u32)
        .collect::<Vec<_>>();
    for (node, descendants) in nodes.iter_mut().zip(counts) {
        node.descendant_count = descendants;
    }

    nodes
}

fn pick_parent(nodes: &[LineageNode], rng: &mut StdRng) -> usize {
    for _ in 0..8 {
        let candidate = rng.random_range(0..nodes.len());
        if !nodes[candidate].is_extinct() {
            return candidate;
        }
    }
    rng.random_range(0..nodes.len())
}

fn child_suffix(number: usize) -> String {
    let letter = (b'a' + (number % 26) as u8) as char;
    if number < 26 {
        letter.to_string()
    } else {
        format!("{letter}{}", number / 26)
    }
}

fn name_node(node: &mut LineageNode, rng: &mut StdRng) {
    let genus = format!(
        "{}{}",
        GENUS_SYLLABLES[rng.random_range(0..GENUS_SYLLABLES.len())],
        ["us", "a", "ia", "on"][rng.random_range(0..4)]
    );
    let epithet = format!(
        "{}{}",
        ["al", "mar", "sub", "pro", "neo", "tri"][rng.random_range(0..6)],
        EPITHET_SYLLABLES[rng.random_range(0..EPITHET_SYLLABLES.len())]
    );
    node.latin_name = format!("{genus} {epithet}");
    node.common_name = format!(
        "{} {}",
        COMMON_PREFIXES[rng.random_range(0..COMMON_PREFIXES.len())],
        COMMON_SUFFIXES[rng.random_range(0..COMMON_SUFFIXES.len())]
    );
}
