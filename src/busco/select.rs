use std::collections::{BTreeMap, BTreeSet};

use super::scan::SpeciesRun;

/// 占有率记录：BUSCO ID → 拥有该单拷贝 BUSCO 的物种集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    n_species: usize,
    markers: BTreeMap<String, BTreeSet<String>>,
}

impl Occupancy {
    pub fn from_species(species: &[SpeciesRun]) -> Self {
        Self::from_sets(species.iter().map(|s| (s.name.as_str(), s.markers.keys().map(String::as_str))))
    }

    /// 从 (物种名, 单拷贝 BUSCO ID 列表) 构建
    pub fn from_sets<'a, S, M>(sets: S) -> Self
    where
        S: IntoIterator<Item = (&'a str, M)>,
        M: IntoIterator<Item = &'a str>,
    {
        let mut n_species = 0;
        let mut markers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (species, ids) in sets {
            n_species += 1;
            for id in ids {
                markers.entry(id.to_string()).or_default().insert(species.to_string());
            }
        }
        Self { n_species, markers }
    }

    pub fn n_species(&self) -> usize {
        self.n_species
    }

    pub fn n_markers(&self) -> usize {
        self.markers.len()
    }

    /// 出现比例 ≥ `percent / 100` 的 BUSCO，按 ID 升序。
    ///
    /// 比较 `count * 100 >= percent * n`，不做除法。
    pub fn select(&self, percent: f64) -> Vec<String> {
        if self.n_species == 0 {
            return Vec::new();
        }
        let n = self.n_species as f64;
        self.markers
            .iter()
            .filter(|(_, sp)| !sp.is_empty() && sp.len() as f64 * 100.0 >= percent * n)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
