//! edgemon - ESP32-S3 输入监视器固件
//!
//! 基于 Embassy 异步运行时:
//! - 线程模式执行器 + 三个中断执行器提供按优先级的抢占
//! - 每个周期任务由 `PeriodicRunner` 按绝对时间基准释放
//!
//! 引脚分配: GPIO4 = 按键 1，GPIO5 = 按键 2，UART0 (GPIO43/44) = 输出

#![no_std]
#![no_main]
#![cfg_attr(feature = "log-defmt", feature(asm_experimental_arch))]

use embassy_executor::{SendSpawner, SpawnError, SpawnToken, Spawner};
use embassy_time::{Delay, Duration, Timer};
use esp_hal::{
    gpio::{Input, InputConfig, Pull},
    interrupt::{software::SoftwareInterruptControl, Priority},
    timer::timg::TimerGroup,
    uart::{self, Uart},
    Blocking,
};
use esp_rtos::embassy::InterruptExecutor;
use heapless::String;
use static_cell::StaticCell;

use edgemon::config::{self, executor_level, TaskConfig, LOAD_1_TICKS, LOAD_2_TICKS, TASK_TABLE};
use edgemon::message::Button;
use edgemon::sched::clock::EmbassyClock;
use edgemon::tasks::{ButtonMonitor, LoadSimulator, PeriodicTransmitter, QueueDrain};
use edgemon::{MonitorContext, PeriodicRunner, Tick, TaskId, TickSource};

esp_bootloader_esp_idf::esp_app_desc!();

// ===== 条件编译日志 =====
#[allow(unused_imports)]
use edgemon::util::log::*;

// ===== Panic Handler =====
#[cfg(any(feature = "dev", feature = "log-println"))]
use esp_backtrace as _;

#[cfg(feature = "log-defmt")]
use defmt_rtt as _;

#[cfg(all(feature = "log-defmt", not(any(feature = "dev", feature = "log-println"))))]
#[defmt::panic_handler]
fn defmt_panic() -> ! {
    loop {
        unsafe { core::arch::asm!("break 1, 15") }
    }
}

#[cfg(not(any(feature = "dev", feature = "log-println")))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {
        core::hint::spin_loop();
    }
}

// ===== 静态分配 =====
static CONTEXT: StaticCell<MonitorContext> = StaticCell::new();

static EXECUTOR_LEVEL_1: StaticCell<InterruptExecutor<0>> = StaticCell::new();
static EXECUTOR_LEVEL_2: StaticCell<InterruptExecutor<1>> = StaticCell::new();
static EXECUTOR_LEVEL_3: StaticCell<InterruptExecutor<2>> = StaticCell::new();

/// 统计报告间隔
const REPORT_INTERVAL: Duration = Duration::from_secs(10);

// ===== 任务入口 =====
#[embassy_executor::task(pool_size = 2)]
async fn button_task(cfg: &'static TaskConfig, button: Button, pin: Input<'static>, ctx: &'static MonitorContext) {
    let monitor = ButtonMonitor::new(button, pin, Delay);
    PeriodicRunner::new(cfg.period, EmbassyClock).run(monitor, ctx).await
}

#[embassy_executor::task]
async fn transmitter_task(cfg: &'static TaskConfig, ctx: &'static MonitorContext) {
    PeriodicRunner::new(cfg.period, EmbassyClock)
        .run(PeriodicTransmitter::new(), ctx)
        .await
}

#[embassy_executor::task]
async fn drain_task(cfg: &'static TaskConfig, uart: Uart<'static, Blocking>, ctx: &'static MonitorContext) {
    PeriodicRunner::new(cfg.period, EmbassyClock)
        .run(QueueDrain::new(uart), ctx)
        .await
}

#[embassy_executor::task(pool_size = 2)]
async fn load_task(cfg: &'static TaskConfig, magnitude: u32, ctx: &'static MonitorContext) {
    let sim = LoadSimulator::new(cfg.id, magnitude, EmbassyClock);
    PeriodicRunner::new(cfg.period, EmbassyClock).run(sim, ctx).await
}

/// 把任务放到它优先级对应的执行器上
fn spawn_at<S: Send>(spawners: &[SendSpawner; 4], cfg: &TaskConfig, token: Result<SpawnToken<S>, SpawnError>) {
    let level = executor_level(cfg.priority) as usize;
    match token {
        Ok(token) => {
            spawners[level].spawn(token);
            log_info!("{} spawned at executor level {}", cfg.id.name(), level);
        }
        Err(_) => log_error!("{}: task pool exhausted", cfg.id.name()),
    }
}

// ===== 主入口点 =====
#[esp_rtos::main]
async fn main(spawner: Spawner) {
    // ========================================
    // 1. 硬件初始化
    // ========================================
    let peripherals = esp_hal::init(esp_hal::Config::default());

    log_info!("{} {} starting on ESP32-S3", edgemon::NAME, edgemon::VERSION);

    // ========================================
    // 2. 时间驱动 (esp-rtos)
    // ========================================
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_ints = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0);

    // ========================================
    // 3. 启动前校验任务表
    // ========================================
    if let Err(e) = config::validate(&TASK_TABLE_STATIC) {
        log_error!(
            "task table rejected: {} ({})",
            e.kind(),
            e.task().map_or("-", TaskId::name)
        );
        loop {
            Timer::after(Duration::from_secs(1)).await;
        }
    }

    // ========================================
    // 4. 外设
    // ========================================
    let pin_config = InputConfig::default().with_pull(Pull::Down);
    let mut pin_1 = Some(Input::new(peripherals.GPIO4, pin_config));
    let mut pin_2 = Some(Input::new(peripherals.GPIO5, pin_config));

    let uart = match Uart::new(peripherals.UART0, uart::Config::default()) {
        Ok(uart) => uart.with_tx(peripherals.GPIO43).with_rx(peripherals.GPIO44),
        Err(_) => {
            log_error!("UART0 configuration rejected");
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };
    let mut uart = Some(uart);

    // ========================================
    // 5. 执行器: 线程模式 + 软件中断优先级 1..=3
    // ========================================
    let level_1 = EXECUTOR_LEVEL_1.init(InterruptExecutor::new(sw_ints.software_interrupt0));
    let level_2 = EXECUTOR_LEVEL_2.init(InterruptExecutor::new(sw_ints.software_interrupt1));
    let level_3 = EXECUTOR_LEVEL_3.init(InterruptExecutor::new(sw_ints.software_interrupt2));
    let spawners = [
        spawner.make_send(),
        level_1.start(Priority::Priority1),
        level_2.start(Priority::Priority2),
        level_3.start(Priority::Priority3),
    ];

    log_info!("Executors started");

    // ========================================
    // 6. 共享上下文与任务
    // ========================================
    let ctx: &'static MonitorContext = CONTEXT.init(MonitorContext::new());
    ctx.stats().mark_start(EmbassyClock.now());

    for cfg in TASK_TABLE_STATIC.iter() {
        match cfg.id {
            TaskId::ButtonMonitor1 => {
                if let Some(pin) = pin_1.take() {
                    spawn_at(&spawners, cfg, button_task(cfg, Button::One, pin, ctx));
                }
            }
            TaskId::ButtonMonitor2 => {
                if let Some(pin) = pin_2.take() {
                    spawn_at(&spawners, cfg, button_task(cfg, Button::Two, pin, ctx));
                }
            }
            TaskId::PeriodicTransmitter => spawn_at(&spawners, cfg, transmitter_task(cfg, ctx)),
            TaskId::UartReceiver => {
                if let Some(uart) = uart.take() {
                    spawn_at(&spawners, cfg, drain_task(cfg, uart, ctx));
                }
            }
            TaskId::Load1Simulation => spawn_at(&spawners, cfg, load_task(cfg, LOAD_1_TICKS, ctx)),
            TaskId::Load2Simulation => spawn_at(&spawners, cfg, load_task(cfg, LOAD_2_TICKS, ctx)),
        }
    }

    log_info!("All tasks spawned, entering report loop");

    // ========================================
    // 7. 主循环 - 周期性统计报告
    // ========================================
    let mut report: String<256> = String::new();
    loop {
        Timer::after(REPORT_INTERVAL).await;

        let now: Tick = EmbassyClock.now();
        let snapshot = ctx.snapshot(now);
        report.clear();
        if snapshot.write_report(&mut report).is_err() {
            log_warn!("report truncated");
        }
        log_info!("{}", report.as_str());
    }
}

/// 任务表的 `'static` 副本，任务入口持有其中条目的引用
static TASK_TABLE_STATIC: [TaskConfig; TaskId::COUNT] = TASK_TABLE;
