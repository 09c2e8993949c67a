mod app;
mod playlist_state;
mod settings;
mod tabs;
mod theme;
mod view_state;
mod workers;

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("MoodTune")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(720.0, 760.0),
            exit_on_close_request: false,
            ..Default::default()
        })
        .run()
}
