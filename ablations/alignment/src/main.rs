//! 标签定位消融实验: 在合成细胞核群体上, 分别用三种 profile 定位尖端,
//! 比较耗时与定位误差.

mod result;
mod runner;
mod stats;

fn main() -> std::io::Result<()> {
    simple_logger::init_with_level(log::Level::Info).expect("Logger initialization error");
    let result = runner::run();
    result.analyze()
}
