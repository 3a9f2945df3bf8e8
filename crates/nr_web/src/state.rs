use nr_reader::Reader;

pub struct AppState {
    pub reader: Reader,
}
