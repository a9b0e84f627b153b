use fixture::Fixture;


mod list;
mod round_trip;
