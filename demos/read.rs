use linux_embedded_hal;

use pm1003::*;
use std::time::Duration as StdDuration;

fn main() {
    let path = std::env::args()
        .skip(1)
        .next()
        .expect("Missing path to device");

    println!("Connecting to: {}", path);

    let device = linux_embedded_hal::Serial::open(std::path::Path::new(&path)).unwrap();

    let mut presence = |state: bool| println!("presence: {}", state);
    let mut pm2_5 = |value: f32| println!("PM2.5: {:.1} µg/m³", value);

    let config = Config::default()
        .with_uart(true)
        .with_poll_interval(Duration::secs(2));
    let mut sensor = Pm1003::with_uart(device, config);
    sensor.set_binary_sensor(&mut presence);
    sensor.set_pm_2_5_sensor(&mut pm2_5);
    sensor.setup().unwrap();

    let start = std::time::Instant::now();
    let mut scheduler = Scheduler::for_component(&sensor);
    scheduler.start(Instant::from_ticks(0));

    loop {
        let now = Instant::from_ticks(start.elapsed().as_millis() as u64);
        if !scheduler.poll(now, &mut sensor) {
            std::thread::sleep(StdDuration::from_millis(50));
        }
    }
}
