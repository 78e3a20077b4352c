//! 程序运行函数.

use crate::result::AblationResult;
use crate::stats::AlignStats;
use log::info;
use morph_berry::prelude::*;
use std::thread;
use utils::loader::RunConfig;

/// 在 `population` 上反复定位尖端, 统计耗时与误差.
fn align(
    ty: ProfileType,
    config: &RunConfig,
    population: &CellPopulation,
    collection: &ProfileCollection,
) -> ProfileResult<AlignStats> {
    let mut stats = AlignStats::new();
    let cancel = CancelFlag::new();
    let mut done = 0;
    let tip = utils::tip();

    let mut last = None;
    for round in 0..config.repeats {
        info!("{ty}: round {}/{}", round + 1, config.repeats);
        stats.round_start();
        let fit = locate_landmark(population, collection, ty, &tip, &cancel, |p| {
            let Progress::NucleusDone { done: d, .. } = p;
            done = d;
        })?;
        stats.round_elapsed();
        last = Some(fit);
    }

    if let Some(fit) = last {
        let errors = fit
            .per_nucleus()
            .iter()
            .enumerate()
            .map(|(k, index)| {
                let (len, shift) = config.layout(k);
                index.map(|i| utils::circular_distance(i, utils::true_tip_index(len, shift), len))
            });
        stats.record_errors(errors);
        stats.set_population_index(fit.population_index());
    }
    info!("{ty}: {done} nuclei processed in the last round");
    Ok(stats.finish())
}

/// 实际运行.
pub fn run() -> AblationResult {
    let config = RunConfig::from_env_or_default();
    info!("running with {config:?} on {} cpus", utils::cpus());

    let population = config.population().expect("Synthesizing population error");
    let mut collection = ProfileCollection::new();
    collection
        .create_profile_aggregate_default(&population)
        .expect("Building aggregate error");

    // 群体尖端: 中位数角度 profile 的最大值.
    let median = collection
        .profile(ProfileType::Angle, &Tag::Reference, MEDIAN)
        .expect("Median profile error");
    collection
        .add_index(&utils::tip(), median.index_of_max())
        .expect("Tagging error");
    println!("{collection}");

    println!("Running ablation studies...");
    let (config, population, collection) = (&config, &population, &collection);
    thread::scope(|s| {
        let handles = ProfileType::ALL.map(|ty| s.spawn(move || align(ty, config, population, collection)));

        ProfileType::ALL
            .into_iter()
            .zip(handles.map(|th| {
                th.join()
                    .expect("Thread joining error")
                    .expect("Alignment error")
            }))
            .collect()
    })
}
